use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::debounce::DebounceGate;
use crate::expand::ExpansionState;
use crate::filter::{FilterState, RiskFilter, SearchMode};
use crate::index::{NodeId, TreeIndex};
use crate::node::{FileNode, FilterRange};
use crate::persist::{PersistedState, StateStore};
use crate::sort::{SortDir, SortKey, ViewMode};
use crate::view::{RenderNode, build_view};

/// Default number of enabled metric columns for a fresh explorer.
const DEFAULT_ENABLED_METRICS: usize = 3;

/// One explorer view over an immutable coverage tree.
///
/// Owns the filter, sort, view-mode, pin, expansion and debounce state for a
/// single view instance (single writer, single reader; no sharing across
/// instances) and caches the computed render list behind a dirty flag.
/// Every mutation is total: the worst observable outcome of any input is an
/// empty render list.
pub struct Explorer<'a> {
    index: TreeIndex<'a>,
    filters: FilterState,
    sort_key: SortKey,
    sort_dir: SortDir,
    view_mode: ViewMode,
    name_column_pinned: bool,
    available_metrics: Vec<String>,
    expansion: ExpansionState,
    gate: DebounceGate<FxHashMap<String, FilterRange>>,
    rows: Vec<RenderNode>,
    dirty: bool,
}

impl<'a> Explorer<'a> {
    /// Creates an explorer over a pre-validated tree.
    ///
    /// `available_metrics` is the ordered metric-key list from the
    /// column-visibility collaborator; the first few are enabled by default.
    pub fn new(tree: &'a [FileNode], available_metrics: Vec<String>) -> Self {
        let index = TreeIndex::new(tree);
        let expansion = ExpansionState::all_expanded(&index);
        let mut filters = FilterState::new();
        filters.active_metrics = available_metrics
            .iter()
            .take(DEFAULT_ENABLED_METRICS)
            .cloned()
            .collect();
        Self {
            index,
            filters,
            sort_key: SortKey::Name,
            sort_dir: SortDir::Asc,
            view_mode: ViewMode::Tree,
            name_column_pinned: true,
            available_metrics,
            expansion,
            gate: DebounceGate::default(),
            rows: Vec::new(),
            dirty: true,
        }
    }

    /// Creates an explorer and restores persisted settings from the store.
    pub fn with_persisted(
        tree: &'a [FileNode],
        available_metrics: Vec<String>,
        store: &dyn StateStore,
    ) -> Self {
        let mut explorer = Self::new(tree, available_metrics);
        explorer.apply_persisted(PersistedState::load(store));
        explorer
    }

    /// The ordered render list for the current state, rebuilt on demand.
    pub fn rows(&mut self) -> &[RenderNode] {
        if self.dirty {
            let matched = self.filters.matched_leaves(&self.index);
            self.rows = build_view(
                &self.index,
                &matched,
                &self.expansion,
                &self.sort_key,
                self.sort_dir,
                self.view_mode,
            );
            self.dirty = false;
            tracing::debug!(
                matched = matched.len(),
                rows = self.rows.len(),
                "rebuilt render list"
            );
        }
        &self.rows
    }

    // --- mutation surface ---------------------------------------------

    /// Sets the search text; applies immediately.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filters.set_query(query);
        self.dirty = true;
    }

    /// Sets the search interpretation mode; applies immediately.
    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.filters.set_mode(mode);
        self.dirty = true;
    }

    /// Submits a range-slider value through the debounce gate.
    ///
    /// The value is committed by a later [`Explorer::tick_at`] once input
    /// settles. A newer value for the same metric supersedes the pending
    /// one; pending values for other metrics are kept.
    pub fn update_filter_range(&mut self, metric: &str, values: [f64; 2]) {
        self.update_filter_range_at(metric, values, Instant::now());
    }

    /// Clock-explicit variant of [`Explorer::update_filter_range`].
    pub fn update_filter_range_at(&mut self, metric: &str, values: [f64; 2], now: Instant) {
        // The pending candidate is the merged per-metric update map, so a
        // settled value for one slider survives a touch on another.
        let mut pending = self.gate.flush().unwrap_or_default();
        pending.insert(metric.to_string(), FilterRange::new(values[0], values[1]));
        self.gate.submit_at(pending, now);
    }

    /// Commits the settled range updates, if any; returns whether the render
    /// list changed. Committed values merge into the live filter state, so a
    /// late commit is evaluated against the current snapshot, never a stale
    /// one.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        let Some(updates) = self.gate.poll_at(now) else {
            return false;
        };
        for (metric, range) in &updates {
            tracing::trace!(metric = %metric, "committing debounced range");
            self.filters.set_range(metric, *range);
        }
        self.dirty = true;
        true
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Drops any pending range update (view teardown).
    pub fn cancel_pending(&mut self) {
        self.gate.cancel();
    }

    /// Sets the risk bucket; applies immediately.
    pub fn set_risk_filter(&mut self, risk: RiskFilter) {
        self.filters.risk = risk;
        self.dirty = true;
    }

    /// Header-click semantics: the same key toggles direction, a new key
    /// sorts ascending.
    pub fn set_sort_key(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_dir = self.sort_dir.toggled();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDir::Asc;
        }
        self.dirty = true;
    }

    pub fn set_sort_dir(&mut self, dir: SortDir) {
        self.sort_dir = dir;
        self.dirty = true;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.dirty = true;
    }

    /// Toggles a folder's expansion, optionally for its whole subtree.
    pub fn toggle_folder(&mut self, id: NodeId, recursive: bool) {
        self.expansion.toggle(&self.index, id, recursive);
        self.dirty = true;
    }

    /// Flips a metric column on or off, preserving the available-metric
    /// order of the enabled set.
    pub fn toggle_metric(&mut self, metric: &str) {
        let next: Vec<String> = {
            let mut enabled: FxHashSet<&str> = self
                .filters
                .active_metrics
                .iter()
                .map(String::as_str)
                .collect();
            if !enabled.remove(metric) {
                enabled.insert(metric);
            }
            self.available_metrics
                .iter()
                .filter(|candidate| enabled.contains(candidate.as_str()))
                .cloned()
                .collect()
        };
        self.filters.active_metrics = next;
        self.dirty = true;
    }

    pub fn set_name_column_pinned(&mut self, pinned: bool) {
        self.name_column_pinned = pinned;
    }

    // --- persistence ----------------------------------------------------

    /// Captures the persistable settings.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            query: self.filters.query().to_string(),
            search_mode: self.filters.mode(),
            risk: self.filters.risk,
            ranges: self.filters.ranges.clone(),
            sort_key: self.sort_key.clone(),
            sort_dir: self.sort_dir,
            view_mode: self.view_mode,
            name_column_pinned: self.name_column_pinned,
            active_metrics: Some(self.filters.active_metrics.clone()),
        }
    }

    /// Writes the persistable settings through the injected store.
    pub fn persist(&self, store: &mut dyn StateStore) {
        self.persisted().save(store);
    }

    fn apply_persisted(&mut self, state: PersistedState) {
        self.filters.set_mode(state.search_mode);
        self.filters.set_query(state.query);
        self.filters.risk = state.risk;
        self.filters.ranges.clear();
        for (metric, range) in state.ranges {
            self.filters.set_range(&metric, range);
        }
        self.sort_key = state.sort_key;
        self.sort_dir = state.sort_dir;
        self.view_mode = state.view_mode;
        self.name_column_pinned = state.name_column_pinned;
        if let Some(cols) = state.active_metrics {
            // Intersect with the available list, preserving its order.
            self.filters.active_metrics = self
                .available_metrics
                .iter()
                .filter(|metric| cols.contains(metric))
                .cloned()
                .collect();
        }
        self.dirty = true;
    }

    /// Captures the expanded-folder ids for external persistence.
    pub fn expansion_snapshot(&self) -> Vec<String> {
        self.expansion.snapshot(&self.index)
    }

    /// Restores the expanded-folder set from persisted ids.
    pub fn restore_expansion(&mut self, ids: &[String]) {
        self.expansion = ExpansionState::restore(&self.index, ids);
        self.dirty = true;
    }

    // --- accessors --------------------------------------------------------

    #[inline]
    pub const fn index(&self) -> &TreeIndex<'a> {
        &self.index
    }

    /// Resolves a render-list id back to its node.
    #[inline]
    pub fn node(&self, id: NodeId) -> &'a FileNode {
        self.index.node(id)
    }

    #[inline]
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expansion.is_expanded(id)
    }

    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub const fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }

    pub const fn sort_dir(&self) -> SortDir {
        self.sort_dir
    }

    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub const fn name_column_pinned(&self) -> bool {
        self.name_column_pinned
    }

    pub fn available_metrics(&self) -> &[String] {
        &self.available_metrics
    }
}
