//! Filter-sort-view engine for hierarchical code-coverage reports.
//!
//! Given an immutable tree of folders and files annotated with per-metric
//! coverage and risk statuses, [`Explorer`] computes the exact ordered row
//! list to display for the current filter, sort, view-mode, and
//! expand/collapse state. Rendering, tree construction, and the persistence
//! transport are external: the engine consumes a pre-validated tree and an
//! injected [`StateStore`] capability, and produces [`RenderNode`] rows.

mod debounce;
mod expand;
mod filter;
mod index;
mod node;
mod persist;
pub mod prelude;
mod sort;
mod state;
#[cfg(test)]
mod testutil;
mod view;

pub use debounce::{DEFAULT_RANGE_DEBOUNCE, DebounceGate};
pub use expand::ExpansionState;
pub use filter::{FilterState, RiskFilter, SearchMode};
pub use index::{NodeId, TreeIndex};
pub use node::{CoverageDetail, FileNode, FilterRange, NodeKind, RiskLevel};
pub use persist::{MemoryStore, PersistError, PersistedState, StateStore, keys};
pub use sort::{CoverageField, SortDir, SortKey, ViewMode, compare};
pub use state::Explorer;
pub use view::{RenderNode, build_view};
