use rustc_hash::{FxBuildHasher, FxHashSet};
use smallvec::SmallVec;

use crate::expand::ExpansionState;
use crate::index::{NodeId, TreeIndex};
use crate::sort::{SortDir, SortKey, ViewMode, compare};

/// One row of the render list: a node plus its display depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderNode {
    pub id: NodeId,
    pub depth: u16,
}

/// Produces the ordered render list for the current view.
///
/// Flat mode emits the matched files only, globally sorted, all at depth 0.
/// Tree mode emits matched files plus every ancestor folder; folders with
/// no matching descendant are excluded entirely, and an empty match set
/// yields an empty list rather than the unfiltered tree. Siblings are
/// reordered by the comparator at every level, and a collapsed folder's
/// subtree is omitted from the output.
pub fn build_view(
    index: &TreeIndex<'_>,
    matched: &FxHashSet<NodeId>,
    expanded: &ExpansionState,
    sort_key: &SortKey,
    sort_dir: SortDir,
    view_mode: ViewMode,
) -> Vec<RenderNode> {
    match view_mode {
        ViewMode::Flat => build_flat(index, matched, sort_key, sort_dir),
        ViewMode::Tree => build_tree(index, matched, expanded, sort_key, sort_dir),
    }
}

fn build_flat(
    index: &TreeIndex<'_>,
    matched: &FxHashSet<NodeId>,
    sort_key: &SortKey,
    sort_dir: SortDir,
) -> Vec<RenderNode> {
    // Iterate the leaf list rather than the set for deterministic input order.
    let mut rows: Vec<NodeId> = index
        .leaves()
        .iter()
        .copied()
        .filter(|id| matched.contains(id))
        .collect();
    rows.sort_by(|&a, &b| {
        compare(
            index.node(a),
            index.node(b),
            sort_key,
            sort_dir,
            ViewMode::Flat,
        )
    });
    rows.into_iter()
        .map(|id| RenderNode { id, depth: 0 })
        .collect()
}

fn build_tree(
    index: &TreeIndex<'_>,
    matched: &FxHashSet<NodeId>,
    expanded: &ExpansionState,
    sort_key: &SortKey,
    sort_dir: SortDir,
) -> Vec<RenderNode> {
    // Visible set: matched leaves plus their ancestor chains. The walk stops
    // at the first already-visited ancestor, bounding the total cost by the
    // node count.
    let mut visible = FxHashSet::with_capacity_and_hasher(index.len(), FxBuildHasher);
    for &leaf in matched {
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            if !visible.insert(id) {
                break;
            }
            cursor = index.parent(id);
        }
    }
    if visible.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(visible.len());
    emit_level(
        index, &visible, expanded, sort_key, sort_dir, index.roots(), 0, &mut out,
    );
    out
}

#[allow(clippy::too_many_arguments)]
fn emit_level(
    index: &TreeIndex<'_>,
    visible: &FxHashSet<NodeId>,
    expanded: &ExpansionState,
    sort_key: &SortKey,
    sort_dir: SortDir,
    siblings: &[NodeId],
    depth: u16,
    out: &mut Vec<RenderNode>,
) {
    let mut level: SmallVec<[NodeId; 8]> = siblings
        .iter()
        .copied()
        .filter(|id| visible.contains(id))
        .collect();
    level.sort_by(|&a, &b| {
        compare(
            index.node(a),
            index.node(b),
            sort_key,
            sort_dir,
            ViewMode::Tree,
        )
    });
    for id in level {
        out.push(RenderNode { id, depth });
        if index.node(id).is_folder() && expanded.is_expanded(id) {
            emit_level(
                index,
                visible,
                expanded,
                sort_key,
                sort_dir,
                index.children(id),
                depth + 1,
                out,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterState, RiskFilter};
    use crate::node::{FileNode, RiskLevel};
    use crate::testutil::{file, file_with, folder};

    fn all_leaves(index: &TreeIndex<'_>) -> FxHashSet<NodeId> {
        FilterState::new().matched_leaves(index)
    }

    fn names(index: &TreeIndex<'_>, rows: &[RenderNode]) -> Vec<(String, u16)> {
        rows.iter()
            .map(|row| (index.node(row.id).name.clone(), row.depth))
            .collect()
    }

    // Input order is already name-sorted with folders first, so the default
    // sort reproduces the natural pre-order.
    fn sample() -> Vec<FileNode> {
        vec![folder(
            "src",
            "src",
            vec![
                folder("core", "src/core", vec![file("a", "src/core/alpha.rs")]),
                file("b", "src/beta.rs"),
                file("c", "src/gamma.rs"),
            ],
        )]
    }

    #[test]
    fn default_view_reproduces_the_tree_in_preorder() {
        let tree = sample();
        let index = TreeIndex::new(&tree);
        let expanded = ExpansionState::all_expanded(&index);
        let rows = build_view(
            &index,
            &all_leaves(&index),
            &expanded,
            &SortKey::Name,
            SortDir::Asc,
            ViewMode::Tree,
        );
        assert_eq!(
            names(&index, &rows),
            vec![
                ("src".to_string(), 0),
                ("core".to_string(), 1),
                ("alpha.rs".to_string(), 2),
                ("beta.rs".to_string(), 1),
                ("gamma.rs".to_string(), 1),
            ]
        );
        // No duplicates, no omissions.
        assert_eq!(rows.len(), index.len());
    }

    #[test]
    fn folders_without_matching_descendants_are_excluded() {
        let tree = sample();
        let index = TreeIndex::new(&tree);
        let expanded = ExpansionState::all_expanded(&index);
        let mut filters = FilterState::new();
        filters.set_query("beta");
        let rows = build_view(
            &index,
            &filters.matched_leaves(&index),
            &expanded,
            &SortKey::Name,
            SortDir::Asc,
            ViewMode::Tree,
        );
        assert_eq!(
            names(&index, &rows),
            vec![("src".to_string(), 0), ("beta.rs".to_string(), 1)]
        );
        // Every emitted folder has a matching descendant file.
        for row in &rows {
            if index.node(row.id).is_folder() {
                let mut stack = index.children(row.id).to_vec();
                let mut found = false;
                while let Some(next) = stack.pop() {
                    if !index.node(next).is_folder() && filters.matches(index.node(next)) {
                        found = true;
                        break;
                    }
                    stack.extend_from_slice(index.children(next));
                }
                assert!(found);
            }
        }
    }

    #[test]
    fn no_matches_yields_an_empty_list() {
        let tree = sample();
        let index = TreeIndex::new(&tree);
        let expanded = ExpansionState::all_expanded(&index);
        let mut filters = FilterState::new();
        filters.set_query("no-such-file");
        let rows = build_view(
            &index,
            &filters.matched_leaves(&index),
            &expanded,
            &SortKey::Name,
            SortDir::Asc,
            ViewMode::Tree,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn collapsed_folder_omits_its_subtree() {
        let tree = sample();
        let index = TreeIndex::new(&tree);
        let mut expanded = ExpansionState::all_expanded(&index);
        expanded.toggle(&index, index.lookup("core").unwrap(), false);
        let rows = build_view(
            &index,
            &all_leaves(&index),
            &expanded,
            &SortKey::Name,
            SortDir::Asc,
            ViewMode::Tree,
        );
        assert_eq!(
            names(&index, &rows),
            vec![
                ("src".to_string(), 0),
                ("core".to_string(), 1),
                ("beta.rs".to_string(), 1),
                ("gamma.rs".to_string(), 1),
            ]
        );
    }

    #[test]
    fn flat_view_emits_sorted_files_at_depth_zero() {
        let tree = sample();
        let index = TreeIndex::new(&tree);
        let expanded = ExpansionState::all_expanded(&index);
        let rows = build_view(
            &index,
            &all_leaves(&index),
            &expanded,
            &SortKey::Name,
            SortDir::Desc,
            ViewMode::Flat,
        );
        let paths: Vec<_> = rows
            .iter()
            .map(|row| index.node(row.id).path.as_str())
            .collect();
        assert_eq!(paths, vec!["src/gamma.rs", "src/core/alpha.rs", "src/beta.rs"]);
        assert!(rows.iter().all(|row| row.depth == 0));
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let tree = sample();
        let index = TreeIndex::new(&tree);
        let expanded = ExpansionState::all_expanded(&index);
        let matched = all_leaves(&index);
        let build = || {
            build_view(
                &index,
                &matched,
                &expanded,
                &SortKey::Name,
                SortDir::Asc,
                ViewMode::Tree,
            )
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn danger_filter_keeps_only_the_failing_branch() {
        // analyzer -> { cpp -> analyzer.go (safe), go -> analyzer.go (safe),
        //               analyzer.go (danger, 0%) }
        let tree = vec![folder(
            "analyzer",
            "analyzer",
            vec![
                folder(
                    "cpp",
                    "analyzer/cpp",
                    vec![file_with(
                        "cpp-a",
                        "analyzer/cpp/analyzer.go",
                        &[("lineCoverage", 88.18, RiskLevel::Safe)],
                    )],
                ),
                folder(
                    "go",
                    "analyzer/go",
                    vec![file_with(
                        "go-a",
                        "analyzer/go/analyzer.go",
                        &[("lineCoverage", 86.31, RiskLevel::Safe)],
                    )],
                ),
                file_with(
                    "root-a",
                    "analyzer/analyzer.go",
                    &[("lineCoverage", 0.0, RiskLevel::Danger)],
                ),
            ],
        )];
        let index = TreeIndex::new(&tree);
        let expanded = ExpansionState::all_expanded(&index);
        let mut filters = FilterState::new();
        filters.active_metrics = vec!["lineCoverage".to_string()];
        filters.risk = RiskFilter::Danger;
        let rows = build_view(
            &index,
            &filters.matched_leaves(&index),
            &expanded,
            &SortKey::Name,
            SortDir::Asc,
            ViewMode::Tree,
        );
        assert_eq!(
            names(&index, &rows),
            vec![("analyzer".to_string(), 0), ("analyzer.go".to_string(), 1)]
        );
        assert_eq!(index.node(rows[1].id).id, "root-a");
    }
}
