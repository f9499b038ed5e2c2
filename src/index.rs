use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::node::FileNode;

/// Dense node identifier assigned at indexing time.
///
/// Ids are stable for the lifetime of the index, which itself borrows the
/// tree, so a `NodeId` never outlives the node it names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flat index over an immutable coverage tree.
///
/// Built once per tree with a single depth-first walk preserving input
/// order; parents are recorded before descending. The engine never reads
/// the nested structure again: all traversal goes through the arena tables
/// here.
pub struct TreeIndex<'a> {
    nodes: Vec<&'a FileNode>,
    parent: Vec<Option<NodeId>>,
    children: Vec<Vec<NodeId>>,
    roots: Vec<NodeId>,
    leaves: Vec<NodeId>,
    folders: Vec<NodeId>,
    by_id: FxHashMap<&'a str, NodeId>,
}

impl<'a> TreeIndex<'a> {
    /// Indexes a forest of root nodes.
    pub fn new(tree: &'a [FileNode]) -> Self {
        let mut index = Self {
            nodes: Vec::new(),
            parent: Vec::new(),
            children: Vec::new(),
            roots: Vec::new(),
            leaves: Vec::new(),
            folders: Vec::new(),
            by_id: FxHashMap::with_hasher(FxBuildHasher),
        };
        for root in tree {
            let id = index.walk(root, None);
            index.roots.push(id);
        }
        index
    }

    fn walk(&mut self, node: &'a FileNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.parent.push(parent);
        self.children.push(Vec::with_capacity(node.children.len()));
        self.by_id.insert(node.id.as_str(), id);
        if node.is_folder() {
            self.folders.push(id);
        } else {
            self.leaves.push(id);
        }
        for child in &node.children {
            let child_id = self.walk(child, Some(id));
            self.children[id.index()].push(child_id);
        }
        id
    }

    /// Resolves a `NodeId` to its node.
    #[inline]
    pub fn node(&self, id: NodeId) -> &'a FileNode {
        self.nodes[id.index()]
    }

    /// Returns the parent of a node, or `None` for roots.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent[id.index()]
    }

    /// Returns the children of a node in input order.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.index()]
    }

    /// Root nodes in input order.
    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// File nodes in depth-first pre-order.
    #[inline]
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Folder nodes in depth-first pre-order.
    #[inline]
    pub fn folders(&self) -> &[NodeId] {
        &self.folders
    }

    /// Looks up a node by its stable string id.
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Total number of indexed nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
