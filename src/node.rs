use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Categorical health bucket for a single metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
}

/// Whether a node is a file or a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Numeric summary of one coverage metric.
///
/// `percentage` is the primary filter/sort field; the raw counts are kept
/// for metric-subfield sorting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageDetail {
    pub covered: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncovered: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverable: Option<u64>,
    pub total: u64,
    pub percentage: f64,
}

/// One node of the coverage tree.
///
/// The tree is pre-validated upstream: ids and paths are unique, folders may
/// have children, files never do, and the structure is acyclic. Metrics and
/// statuses are optional per node; an empty map means "no data", which is
/// meaningful (see the permissive range-filter default), not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub metrics: FxHashMap<String, CoverageDetail>,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub statuses: FxHashMap<String, RiskLevel>,
}

impl FileNode {
    /// Returns `true` for folder nodes.
    #[inline]
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Returns the percentage of the given metric, if the node carries it.
    pub fn percentage(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).map(|detail| detail.percentage)
    }
}

/// Inclusive percentage window for one metric, `0 <= min <= max <= 100`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterRange {
    pub min: f64,
    pub max: f64,
}

impl FilterRange {
    /// The default window that filters nothing out.
    pub const FULL: Self = Self {
        min: 0.0,
        max: 100.0,
    };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive containment check on both bounds.
    #[inline]
    pub fn contains(&self, percentage: f64) -> bool {
        percentage >= self.min && percentage <= self.max
    }

    /// Returns `true` if the range is the full `[0, 100]` window.
    #[inline]
    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

impl Default for FilterRange {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive() {
        let range = FilterRange::new(40.0, 60.0);
        assert!(range.contains(40.0));
        assert!(range.contains(60.0));
        assert!(!range.contains(39.0));
        assert!(!range.contains(61.0));
    }

    #[test]
    fn node_deserializes_from_report_schema() {
        let raw = r#"{
            "id": "f1",
            "name": "calculator.cpp",
            "type": "file",
            "path": "src/calculator.cpp",
            "metrics": {
                "lineCoverage": {"covered": 10, "total": 20, "percentage": 50.0}
            },
            "statuses": {"lineCoverage": "warning"}
        }"#;
        let node: FileNode = serde_json::from_str(raw).unwrap();
        assert_eq!(node.kind, NodeKind::File);
        assert!(node.children.is_empty());
        assert_eq!(node.percentage("lineCoverage"), Some(50.0));
        assert_eq!(node.percentage("branchCoverage"), None);
        assert_eq!(node.statuses["lineCoverage"], RiskLevel::Warning);
    }
}
