/// Immutable device-tree snapshots.
///
/// A [`Snapshot`] is built once from a raw enumerator tree, published once,
/// and shared as `Arc<Snapshot>` until the last holder (the registry, an
/// open context menu, an in-flight worker message) lets go. Nodes live in
/// an arena sorted by `InstanceIdHash`, so lookup across snapshots is a
/// binary search. The roots/children lists are index views into that arena.
pub mod builder;
pub mod registry;

pub use builder::{build, create_if_stale, is_included};
pub use registry::{NodeState, PublishReport, PublishedTree, SnapshotRegistry};

use crate::model::{DeviceItem, ItemIndex, RawTree};
use std::sync::Arc;
use tracing::debug;

/// Index into a snapshot's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One included device item.
#[derive(Debug, Clone)]
pub struct Node {
    /// The device item this node shows, in the snapshot's raw tree.
    pub item: ItemIndex,

    /// Copied from the item for cache-friendly lookup.
    pub instance_id_hash: u32,

    pub parent: Option<NodeIndex>,

    /// Included children, in display order (name-sorted or enumerator order).
    pub children: Vec<NodeIndex>,
}

/// An immutable, queryable device tree.
pub struct Snapshot {
    /// Keeps the enumerator's items alive for as long as the snapshot.
    raw: Arc<RawTree>,

    /// Arena sorted by `instance_id_hash`.
    nodes: Vec<Node>,

    roots: Vec<NodeIndex>,
}

impl Snapshot {
    /// Assemble a snapshot. `nodes` must already be sorted by hash.
    pub(crate) fn from_parts(raw: Arc<RawTree>, nodes: Vec<Node>, roots: Vec<NodeIndex>) -> Self {
        debug_assert!(
            nodes
                .windows(2)
                .all(|w| w[0].instance_id_hash <= w[1].instance_id_hash),
            "snapshot nodes must be sorted by hash"
        );
        Self { raw, nodes, roots }
    }

    /// An empty snapshot over an empty raw tree.
    pub fn empty() -> Self {
        Self::from_parts(Arc::new(RawTree::empty()), Vec::new(), Vec::new())
    }

    /// Binary search for the node with the given instance id hash.
    pub fn lookup(&self, instance_id_hash: u32) -> Option<NodeIndex> {
        self.nodes
            .binary_search_by_key(&instance_id_hash, |n| n.instance_id_hash)
            .ok()
            .map(NodeIndex::new)
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.idx()]
    }

    /// The device item behind a node.
    #[inline]
    pub fn item(&self, index: NodeIndex) -> &DeviceItem {
        self.raw.item(self.nodes[index.idx()].item)
    }

    /// The flat node arena, sorted by hash.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All node indices in arena (hash) order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len()).map(NodeIndex::new)
    }

    /// Top-level nodes in display order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Children of `parent`, or the roots for `None`.
    pub fn children(&self, parent: Option<NodeIndex>) -> &[NodeIndex] {
        match parent {
            Some(p) => &self.nodes[p.idx()].children,
            None => &self.roots,
        }
    }

    /// The raw tree this snapshot was built from.
    pub fn raw_tree(&self) -> &Arc<RawTree> {
        &self.raw
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots.len())
            .field("raw_items", &self.raw.len())
            .finish()
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        debug!(nodes = self.nodes.len(), "Snapshot released");
    }
}
