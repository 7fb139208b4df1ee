/// Snapshot registry: owns the active snapshot and swaps it on publish.
///
/// Lives on the UI thread. Per-node UI state (selection, visibility) is
/// kept next to the snapshot in a parallel vector rather than inside the
/// shared nodes, so snapshots stay immutable and freely shareable across
/// threads.
use super::{NodeIndex, Snapshot};
use crate::diff::{self, HighlightState, HighlightTracker};
use crate::enumerator::DeviceEnumerator;
use crate::model::RawTree;
use crate::settings::TreeConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// UI-thread-only state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    pub selected: bool,
    /// Passes the current search filter.
    pub visible: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            selected: false,
            visible: true,
        }
    }
}

/// The published snapshot together with its node states.
#[derive(Debug)]
pub struct PublishedTree {
    pub snapshot: Arc<Snapshot>,
    pub states: Vec<NodeState>,
}

impl PublishedTree {
    fn new(snapshot: Arc<Snapshot>) -> Self {
        let states = vec![NodeState::default(); snapshot.len()];
        Self { snapshot, states }
    }

    #[inline]
    pub fn state(&self, node: NodeIndex) -> &NodeState {
        &self.states[node.idx()]
    }

    #[inline]
    pub fn state_mut(&mut self, node: NodeIndex) -> &mut NodeState {
        &mut self.states[node.idx()]
    }
}

/// Summary of one publish, for logging and the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub nodes: usize,
    /// `true` when nothing was published before (no diff ran).
    pub first: bool,
    pub carried_selection: usize,
    pub arrived: usize,
}

#[derive(Debug, Default)]
pub struct SnapshotRegistry {
    active: Option<PublishedTree>,
    highlights: HighlightTracker,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&PublishedTree> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut PublishedTree> {
        self.active.as_mut()
    }

    pub fn active_snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.active.as_ref().map(|a| &a.snapshot)
    }

    /// The raw tree the active snapshot was built from.
    pub fn active_raw_tree(&self) -> Option<&Arc<RawTree>> {
        self.active_snapshot().map(|s| s.raw_tree())
    }

    /// Build a new snapshot if the enumerator's tree changed since the
    /// active one (or unconditionally when `force`).
    pub fn create_if_stale(
        &self,
        enumerator: &dyn DeviceEnumerator,
        force: bool,
        config: &TreeConfig,
    ) -> Option<Snapshot> {
        super::create_if_stale(enumerator, self.active_raw_tree(), force, config)
    }

    /// Make `snapshot` the active one and diff it against its predecessor.
    ///
    /// The first publish has nothing to diff against, so it neither carries
    /// selection nor starts arrival highlights. The previous snapshot's
    /// reference is released here; it is freed once no context menu or
    /// other holder still references it.
    pub fn publish(
        &mut self,
        snapshot: Arc<Snapshot>,
        config: &TreeConfig,
        now_ticks: i64,
    ) -> PublishReport {
        let mut next = PublishedTree::new(snapshot);
        let previous = self.active.take();

        let report = match &previous {
            Some(old) => {
                let outcome = diff::diff(
                    (old.snapshot.as_ref(), old.states.as_slice()),
                    &next.snapshot,
                    &mut next.states,
                    &mut self.highlights,
                    config,
                    now_ticks,
                );
                PublishReport {
                    nodes: next.snapshot.len(),
                    first: false,
                    carried_selection: outcome.carried_selection,
                    arrived: outcome.arrived,
                }
            }
            None => {
                self.highlights.clear();
                PublishReport {
                    nodes: next.snapshot.len(),
                    first: true,
                    ..PublishReport::default()
                }
            }
        };

        self.active = Some(next);
        drop(previous);

        info!(
            nodes = report.nodes,
            arrived = report.arrived,
            selected = report.carried_selection,
            "Device tree published"
        );
        report
    }

    /// Advance highlight decay. Returns the nodes (in the active snapshot)
    /// whose highlight expired and must be redrawn.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<NodeIndex> {
        let expired = self.highlights.tick(elapsed);
        match self.active_snapshot() {
            Some(snapshot) => expired
                .into_iter()
                .filter_map(|hash| snapshot.lookup(hash))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Highlight state of a node of the active snapshot.
    pub fn highlight(&self, node: NodeIndex) -> HighlightState {
        match self.active_snapshot() {
            Some(snapshot) => self
                .highlights
                .state(snapshot.node(node).instance_id_hash),
            None => HighlightState::Normal,
        }
    }

    pub fn highlights(&self) -> &HighlightTracker {
        &self.highlights
    }
}
