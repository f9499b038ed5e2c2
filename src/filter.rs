use globset::{GlobBuilder, GlobMatcher};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::index::{NodeId, TreeIndex};
use crate::node::{FileNode, FilterRange, RiskLevel};

/// How the search query is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Case-insensitive substring containment.
    #[default]
    #[serde(rename = "normal")]
    Literal,
    /// Wildcard path match with `*`, `**` and `?`.
    #[serde(rename = "glob")]
    Glob,
}

/// Risk bucket selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskFilter {
    #[default]
    All,
    Danger,
    Warning,
    Safe,
}

/// Query compiled once per (text, mode) change and reused across every node.
enum CompiledQuery {
    /// Empty query: everything matches.
    Everything,
    /// Lowercased needle for substring containment against the full path.
    Substring(String),
    Glob {
        matcher: GlobMatcher,
        /// A pattern without a separator also matches the bare file name,
        /// so `*.cpp` finds files at any depth.
        match_name: bool,
    },
    /// Malformed pattern: matches nothing, never errors.
    Nothing,
}

impl CompiledQuery {
    fn compile(query: &str, mode: SearchMode) -> Self {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Self::Everything;
        }
        match mode {
            SearchMode::Literal => Self::Substring(trimmed.to_lowercase()),
            SearchMode::Glob => {
                match GlobBuilder::new(trimmed)
                    .literal_separator(true)
                    .case_insensitive(true)
                    .build()
                {
                    Ok(glob) => Self::Glob {
                        matcher: glob.compile_matcher(),
                        match_name: !trimmed.contains('/'),
                    },
                    Err(err) => {
                        tracing::debug!(pattern = trimmed, %err, "glob rejected, matching nothing");
                        Self::Nothing
                    }
                }
            }
        }
    }

    fn is_match(&self, node: &FileNode) -> bool {
        match self {
            Self::Everything => true,
            Self::Substring(needle) => node.path.to_lowercase().contains(needle),
            Self::Glob {
                matcher,
                match_name,
            } => matcher.is_match(&node.path) || (*match_name && matcher.is_match(&node.name)),
            Self::Nothing => false,
        }
    }
}

/// The compound filter evaluated against every leaf node.
///
/// A node matches only if all three dimensions pass: text, numeric ranges,
/// and risk bucket. The enabled-metric set scopes the risk check.
pub struct FilterState {
    query: String,
    mode: SearchMode,
    compiled: CompiledQuery,
    /// Only non-default windows are present; a missing entry filters nothing.
    pub ranges: FxHashMap<String, FilterRange>,
    pub risk: RiskFilter,
    /// Enabled metric keys in display order.
    pub active_metrics: Vec<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            mode: SearchMode::Literal,
            compiled: CompiledQuery::Everything,
            ranges: FxHashMap::with_hasher(FxBuildHasher),
            risk: RiskFilter::All,
            active_metrics: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub const fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Sets the query text and recompiles the matcher.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.compiled = CompiledQuery::compile(&self.query, self.mode);
    }

    /// Sets the query interpretation mode and recompiles the matcher.
    pub fn set_mode(&mut self, mode: SearchMode) {
        self.mode = mode;
        self.compiled = CompiledQuery::compile(&self.query, self.mode);
    }

    /// Stores a range window; the full `[0, 100]` window clears the entry.
    pub fn set_range(&mut self, metric: &str, range: FilterRange) {
        if range.is_full() {
            self.ranges.remove(metric);
        } else {
            self.ranges.insert(metric.to_string(), range);
        }
    }

    /// Evaluates the compound predicate against one node.
    pub fn matches(&self, node: &FileNode) -> bool {
        self.compiled.is_match(node) && self.ranges_match(node) && self.risk_matches(node)
    }

    /// Collects the set of matching file nodes.
    pub fn matched_leaves(&self, index: &TreeIndex<'_>) -> FxHashSet<NodeId> {
        let mut matched =
            FxHashSet::with_capacity_and_hasher(index.leaves().len(), FxBuildHasher);
        matched.extend(
            index
                .leaves()
                .iter()
                .copied()
                .filter(|&id| self.matches(index.node(id))),
        );
        matched
    }

    fn ranges_match(&self, node: &FileNode) -> bool {
        self.ranges.iter().all(|(metric, range)| {
            // A node without data for the metric is never excluded.
            node.percentage(metric)
                .is_none_or(|percentage| range.contains(percentage))
        })
    }

    fn risk_matches(&self, node: &FileNode) -> bool {
        let mut statuses = self
            .active_metrics
            .iter()
            .filter_map(|metric| node.statuses.get(metric))
            .peekable();
        match self.risk {
            RiskFilter::All => true,
            // No applicable statuses: the node counts as implicitly safe.
            _ if statuses.peek().is_none() => self.risk == RiskFilter::Safe,
            RiskFilter::Danger => statuses.any(|status| *status == RiskLevel::Danger),
            RiskFilter::Warning => statuses.any(|status| *status == RiskLevel::Warning),
            RiskFilter::Safe => statuses.all(|status| *status == RiskLevel::Safe),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::RiskLevel;
    use crate::testutil::{file, file_with};

    fn active(filters: &mut FilterState, metrics: &[&str]) {
        filters.active_metrics = metrics.iter().map(ToString::to_string).collect();
    }

    #[test]
    fn empty_query_matches_everything() {
        let filters = FilterState::new();
        assert!(filters.matches(&file("a", "src/a.rs")));
    }

    #[test]
    fn literal_query_is_case_insensitive_substring_on_path() {
        let mut filters = FilterState::new();
        filters.set_query("  CALC  ");
        assert!(filters.matches(&file("a", "src/Calculator.cpp")));
        assert!(!filters.matches(&file("b", "src/main.rs")));
    }

    #[test]
    fn glob_matches_file_name_at_any_depth() {
        let mut filters = FilterState::new();
        filters.set_mode(SearchMode::Glob);
        filters.set_query("*.cpp");
        assert!(filters.matches(&file("a", "demo_projects/cpp/project/src/calculator.cpp")));
        assert!(!filters.matches(&file("b", "demo_projects/csharp/project/Test/Program.cs")));
    }

    #[test]
    fn glob_double_star_crosses_segments() {
        let mut filters = FilterState::new();
        filters.set_mode(SearchMode::Glob);
        filters.set_query("demo_projects/**/calc?lator.cpp");
        assert!(filters.matches(&file("a", "demo_projects/cpp/project/src/calculator.cpp")));
    }

    #[test]
    fn malformed_glob_matches_nothing() {
        let mut filters = FilterState::new();
        filters.set_mode(SearchMode::Glob);
        filters.set_query("src/[unclosed");
        assert!(!filters.matches(&file("a", "src/[unclosed")));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let mut filters = FilterState::new();
        filters.set_range("lineCoverage", FilterRange::new(40.0, 60.0));
        let at = |pct: f64| file_with("n", "n.rs", &[("lineCoverage", pct, RiskLevel::Safe)]);
        assert!(filters.matches(&at(40.0)));
        assert!(filters.matches(&at(60.0)));
        assert!(!filters.matches(&at(39.0)));
        assert!(!filters.matches(&at(61.0)));
    }

    #[test]
    fn missing_metric_passes_range_filter() {
        let mut filters = FilterState::new();
        filters.set_range("branchCoverage", FilterRange::new(90.0, 100.0));
        assert!(filters.matches(&file_with("n", "n.rs", &[("lineCoverage", 5.0, RiskLevel::Danger)])));
    }

    #[test]
    fn full_range_clears_the_entry() {
        let mut filters = FilterState::new();
        filters.set_range("lineCoverage", FilterRange::new(10.0, 20.0));
        filters.set_range("lineCoverage", FilterRange::FULL);
        assert!(filters.ranges.is_empty());
    }

    #[test]
    fn danger_passes_on_any_danger_status() {
        let mut filters = FilterState::new();
        active(&mut filters, &["lineCoverage", "branchCoverage"]);
        filters.risk = RiskFilter::Danger;
        let node = file_with(
            "n",
            "n.rs",
            &[
                ("lineCoverage", 95.0, RiskLevel::Safe),
                ("branchCoverage", 10.0, RiskLevel::Danger),
            ],
        );
        assert!(filters.matches(&node));
    }

    #[test]
    fn warning_passes_independent_of_danger() {
        let mut filters = FilterState::new();
        active(&mut filters, &["lineCoverage", "branchCoverage"]);
        filters.risk = RiskFilter::Warning;
        let node = file_with(
            "n",
            "n.rs",
            &[
                ("lineCoverage", 60.0, RiskLevel::Warning),
                ("branchCoverage", 10.0, RiskLevel::Danger),
            ],
        );
        assert!(filters.matches(&node));
    }

    #[test]
    fn safe_requires_no_danger_or_warning() {
        let mut filters = FilterState::new();
        active(&mut filters, &["lineCoverage", "branchCoverage"]);
        filters.risk = RiskFilter::Safe;
        let safe = file_with(
            "a",
            "a.rs",
            &[
                ("lineCoverage", 95.0, RiskLevel::Safe),
                ("branchCoverage", 92.0, RiskLevel::Safe),
            ],
        );
        let mixed = file_with(
            "b",
            "b.rs",
            &[
                ("lineCoverage", 95.0, RiskLevel::Safe),
                ("branchCoverage", 60.0, RiskLevel::Warning),
            ],
        );
        assert!(filters.matches(&safe));
        assert!(!filters.matches(&mixed));
    }

    #[test]
    fn node_without_statuses_is_implicitly_safe() {
        let mut filters = FilterState::new();
        active(&mut filters, &["lineCoverage"]);
        let bare = file("n", "n.rs");

        filters.risk = RiskFilter::Safe;
        assert!(filters.matches(&bare));
        filters.risk = RiskFilter::Danger;
        assert!(!filters.matches(&bare));
        filters.risk = RiskFilter::Warning;
        assert!(!filters.matches(&bare));
    }

    #[test]
    fn inactive_metric_statuses_are_ignored() {
        let mut filters = FilterState::new();
        active(&mut filters, &["lineCoverage"]);
        filters.risk = RiskFilter::Danger;
        // Danger only on a metric outside the active set.
        let node = file_with("n", "n.rs", &[("branchCoverage", 5.0, RiskLevel::Danger)]);
        assert!(!filters.matches(&node));
    }
}
