//! Small tree builders shared by the unit tests.

use rustc_hash::FxHashMap;

use crate::node::{CoverageDetail, FileNode, NodeKind, RiskLevel};

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

pub(crate) fn folder(id: &str, path: &str, children: Vec<FileNode>) -> FileNode {
    FileNode {
        id: id.to_string(),
        name: basename(path),
        kind: NodeKind::Folder,
        path: path.to_string(),
        children,
        metrics: FxHashMap::default(),
        statuses: FxHashMap::default(),
    }
}

pub(crate) fn file(id: &str, path: &str) -> FileNode {
    FileNode {
        id: id.to_string(),
        name: basename(path),
        kind: NodeKind::File,
        path: path.to_string(),
        children: Vec::new(),
        metrics: FxHashMap::default(),
        statuses: FxHashMap::default(),
    }
}

/// File node carrying `(metric, percentage, status)` triples.
pub(crate) fn file_with(id: &str, path: &str, metrics: &[(&str, f64, RiskLevel)]) -> FileNode {
    let mut node = file(id, path);
    for &(metric, percentage, status) in metrics {
        node.metrics.insert(
            metric.to_string(),
            CoverageDetail {
                covered: percentage.round() as u64,
                uncovered: None,
                coverable: None,
                total: 100,
                percentage,
            },
        );
        node.statuses.insert(metric.to_string(), status);
    }
    node
}
