pub use crate::{
    CoverageDetail, CoverageField, Explorer, ExpansionState, FileNode, FilterRange, FilterState,
    NodeId, NodeKind, RenderNode, RiskFilter, RiskLevel, SearchMode, SortDir, SortKey, StateStore,
    TreeIndex, ViewMode,
};
