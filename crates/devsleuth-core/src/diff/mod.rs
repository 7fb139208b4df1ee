/// Diff between consecutive snapshots.
///
/// `InstanceIdHash` is the only identity that survives a rebuild. For every
/// node of the new snapshot the previous snapshot is searched by hash and
/// the selection carried over. Independently, devices that arrived within
/// the last ten seconds start an arrival highlight.
pub mod highlight;

pub use highlight::{HighlightState, HighlightTracker};

use crate::model::display::TICKS_PER_SECOND;
use crate::model::DeviceItem;
use crate::settings::TreeConfig;
use crate::snapshot::{NodeState, Snapshot};

/// How recent a last-arrival timestamp must be to count as just arrived.
pub const ARRIVAL_WINDOW_TICKS: i64 = 10 * TICKS_PER_SECOND;

/// `true` if the device's last arrival is set and younger than ten
/// seconds at `now_ticks` (FILETIME).
pub fn is_just_arrived(item: &DeviceItem, now_ticks: i64) -> bool {
    item.last_arrival()
        .is_some_and(|arrived| now_ticks.saturating_sub(arrived) < ARRIVAL_WINDOW_TICKS)
}

/// What a diff changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Selected nodes whose selection was carried into the new snapshot.
    pub carried_selection: usize,
    /// Nodes that started an arrival highlight.
    pub arrived: usize,
}

/// Diff `next` against the previous snapshot and its UI states.
///
/// `next_states` is the new snapshot's state vector (one entry per node,
/// freshly defaulted). Highlights of nodes not in `next` are dropped.
pub fn diff(
    previous: (&Snapshot, &[NodeState]),
    next: &Snapshot,
    next_states: &mut [NodeState],
    highlights: &mut HighlightTracker,
    config: &TreeConfig,
    now_ticks: i64,
) -> DiffOutcome {
    let (old, old_states) = previous;
    let mut outcome = DiffOutcome::default();

    highlights.retain(|hash| next.lookup(hash).is_some());

    for node in next.node_indices() {
        let hash = next.node(node).instance_id_hash;

        if let Some(old_node) = old.lookup(hash) {
            if old_states[old_node.idx()].selected {
                next_states[node.idx()].selected = true;
                outcome.carried_selection += 1;
            }
        }

        if is_just_arrived(next.item(node), now_ticks) {
            highlights.start(hash, config.highlight_duration, config.colors.arrived);
            outcome.arrived += 1;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyClass, PropertyValue};

    const NOW: i64 = 133_000_000_000_000_000;

    fn arrived_at(ticks: i64) -> DeviceItem {
        DeviceItem::new("USB\\X", false)
            .with_property(PropertyClass::LastArrivalDate, PropertyValue::TimeStamp(ticks))
    }

    #[test]
    fn test_just_arrived_window() {
        assert!(is_just_arrived(&arrived_at(NOW), NOW));
        assert!(is_just_arrived(&arrived_at(NOW - 9 * TICKS_PER_SECOND), NOW));
        assert!(!is_just_arrived(&arrived_at(NOW - 10 * TICKS_PER_SECOND), NOW));
        assert!(!is_just_arrived(&arrived_at(NOW - 3600 * TICKS_PER_SECOND), NOW));
    }

    #[test]
    fn test_unknown_arrival_never_highlights() {
        assert!(!is_just_arrived(&DeviceItem::new("X", false), NOW));
        assert!(!is_just_arrived(&arrived_at(0), NOW));
    }
}
