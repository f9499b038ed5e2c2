use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::index::{NodeId, TreeIndex};

/// Expanded-folder set for one tree.
///
/// Created once per tree with every folder expanded; it changes only through
/// [`ExpansionState::toggle`] and is never reset by filter changes.
pub struct ExpansionState {
    expanded: FxHashSet<NodeId>,
}

impl ExpansionState {
    /// Default state: every folder in the tree is expanded.
    pub fn all_expanded(index: &TreeIndex<'_>) -> Self {
        let mut expanded =
            FxHashSet::with_capacity_and_hasher(index.folders().len(), FxBuildHasher);
        expanded.extend(index.folders().iter().copied());
        Self { expanded }
    }

    /// State with every folder collapsed.
    pub fn all_collapsed() -> Self {
        Self {
            expanded: FxHashSet::with_hasher(FxBuildHasher),
        }
    }

    #[inline]
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Toggles one folder, or a whole subtree when `recursive` is set.
    ///
    /// The recursive form takes the opposite of the folder's current state
    /// as the target and applies it to the folder plus every descendant
    /// folder that has children, in one action. Non-folders are ignored.
    pub fn toggle(&mut self, index: &TreeIndex<'_>, id: NodeId, recursive: bool) {
        if !index.node(id).is_folder() {
            return;
        }
        let target = !self.is_expanded(id);
        if !recursive {
            self.set(id, target);
            return;
        }
        self.set(id, target);
        let mut stack: Vec<NodeId> = index.children(id).to_vec();
        while let Some(next) = stack.pop() {
            let node = index.node(next);
            if node.is_folder() && !node.children.is_empty() {
                self.set(next, target);
            }
            stack.extend_from_slice(index.children(next));
        }
    }

    fn set(&mut self, id: NodeId, expand: bool) {
        if expand {
            self.expanded.insert(id);
        } else {
            self.expanded.remove(&id);
        }
    }

    /// Captures the expanded string ids for persistence.
    pub fn snapshot(&self, index: &TreeIndex<'_>) -> Vec<String> {
        let mut ids: Vec<String> = self
            .expanded
            .iter()
            .map(|&id| index.node(id).id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Rebuilds the state from persisted string ids; unknown ids are
    /// dropped (the tree may have changed since the snapshot).
    pub fn restore(index: &TreeIndex<'_>, ids: &[String]) -> Self {
        let mut expanded = FxHashSet::with_capacity_and_hasher(ids.len(), FxBuildHasher);
        expanded.extend(ids.iter().filter_map(|id| index.lookup(id)));
        Self { expanded }
    }

    /// Number of expanded folders.
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
