use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::node::{CoverageDetail, FileNode};

/// Which view the explorer renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Hierarchical tree with ancestor folders.
    #[default]
    Tree,
    /// Flattened file list.
    Flat,
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    /// Flips the direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[inline]
    const fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Asc => ord,
            Self::Desc => ord.reverse(),
        }
    }
}

/// Sortable sub-field of a [`CoverageDetail`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageField {
    Covered,
    Uncovered,
    Coverable,
    Total,
    Percentage,
}

/// Sentinel for nodes missing the compared value; sorts below every
/// real value.
const MISSING: f64 = -1.0;

impl CoverageField {
    #[allow(clippy::cast_precision_loss)]
    fn value(self, detail: &CoverageDetail) -> f64 {
        match self {
            Self::Covered => detail.covered as f64,
            Self::Uncovered => detail.uncovered.map_or(MISSING, |v| v as f64),
            Self::Coverable => detail.coverable.map_or(MISSING, |v| v as f64),
            Self::Total => detail.total as f64,
            Self::Percentage => detail.percentage,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricKeyRepr {
    metric: String,
    sub_metric: CoverageField,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SortKeyRepr {
    Name(String),
    Metric(MetricKeyRepr),
}

/// Sort key: either the display name or a metric sub-field.
///
/// Serializes as the literal string `"name"` or a
/// `{"metric": …, "subMetric": …}` object, the shape the report transport
/// uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SortKeyRepr", into = "SortKeyRepr")]
pub enum SortKey {
    Name,
    Metric { metric: String, field: CoverageField },
}

impl Default for SortKey {
    fn default() -> Self {
        Self::Name
    }
}

impl TryFrom<SortKeyRepr> for SortKey {
    type Error = String;

    fn try_from(repr: SortKeyRepr) -> Result<Self, Self::Error> {
        match repr {
            SortKeyRepr::Name(tag) if tag == "name" => Ok(Self::Name),
            SortKeyRepr::Name(tag) => Err(format!("unknown sort key `{tag}`")),
            SortKeyRepr::Metric(m) => Ok(Self::Metric {
                metric: m.metric,
                field: m.sub_metric,
            }),
        }
    }
}

impl From<SortKey> for SortKeyRepr {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => Self::Name("name".to_string()),
            SortKey::Metric { metric, field } => Self::Metric(MetricKeyRepr {
                metric,
                sub_metric: field,
            }),
        }
    }
}

/// Case-insensitive string ordering with a raw tie-break so equal folds
/// stay deterministic.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Name ordering: folders precede files at the same level in tree mode;
/// within equal kind, display name (tree) or full path (flat).
fn compare_names(a: &FileNode, b: &FileNode, mode: ViewMode) -> Ordering {
    if mode == ViewMode::Tree && a.kind != b.kind {
        return if a.is_folder() {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    match mode {
        ViewMode::Tree => compare_text(&a.name, &b.name),
        ViewMode::Flat => compare_text(&a.path, &b.path),
    }
}

/// Total-order comparator over nodes.
///
/// The folders-before-files rule is not affected by direction; a metric
/// comparison falls back to the ascending name order on equal values so the
/// result is deterministic for identical inputs.
pub fn compare(
    a: &FileNode,
    b: &FileNode,
    key: &SortKey,
    dir: SortDir,
    mode: ViewMode,
) -> Ordering {
    match key {
        SortKey::Name => {
            if mode == ViewMode::Tree && a.kind != b.kind {
                return compare_names(a, b, mode);
            }
            dir.apply(compare_names(a, b, mode))
        }
        SortKey::Metric { metric, field } => {
            let value = |n: &FileNode| n.metrics.get(metric).map_or(MISSING, |d| field.value(d));
            let ord = value(a)
                .partial_cmp(&value(b))
                .unwrap_or(Ordering::Equal);
            if ord == Ordering::Equal {
                compare_names(a, b, mode)
            } else {
                dir.apply(ord)
            }
        }
    }
}
