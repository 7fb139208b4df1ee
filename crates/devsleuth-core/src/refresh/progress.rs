/// Refresh messages: requests from the UI thread to the refresh worker and
/// results back, both over crossbeam channels.
use crate::model::RawTree;
use crate::settings::TreeConfig;
use crate::snapshot::Snapshot;
use std::sync::Arc;
use std::time::Duration;

/// Ask the worker to (maybe) rebuild.
#[derive(Debug, Clone)]
pub struct RefreshRequest {
    /// Issue number; the answering message echoes it back.
    pub seq: u64,
    /// Rebuild even if the enumerator's tree is unchanged.
    pub force: bool,
    /// Configuration to build with.
    pub config: Arc<TreeConfig>,
    /// Raw tree of the currently published snapshot, for the stale check.
    pub active: Option<Arc<RawTree>>,
}

impl RefreshRequest {
    /// Fold a later queued request into this one: the later config,
    /// active tree and sequence number win, `force` sticks.
    pub fn merge(self, later: RefreshRequest) -> RefreshRequest {
        RefreshRequest {
            seq: self.seq.max(later.seq),
            force: self.force || later.force,
            config: later.config,
            active: later.active,
        }
    }
}

/// Results sent from the worker thread to the UI.
#[derive(Debug)]
pub enum RefreshMessage {
    /// A new snapshot is ready to publish.
    Built {
        seq: u64,
        snapshot: Arc<Snapshot>,
        forced: bool,
        duration: Duration,
    },
    /// The enumerator's tree had not changed; nothing to publish.
    Unchanged { seq: u64 },
}

impl RefreshMessage {
    /// Sequence number of the last request this message answers.
    pub fn seq(&self) -> u64 {
        match self {
            RefreshMessage::Built { seq, .. } | RefreshMessage::Unchanged { seq } => *seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_force_and_latest_config() {
        let old = Arc::new(TreeConfig::default());
        let new = Arc::new(TreeConfig {
            show_disconnected: true,
            ..TreeConfig::default()
        });
        let first = RefreshRequest {
            seq: 1,
            force: true,
            config: old,
            active: None,
        };
        let second = RefreshRequest {
            seq: 2,
            force: false,
            config: Arc::clone(&new),
            active: Some(Arc::new(RawTree::empty())),
        };

        let merged = first.merge(second);
        assert!(merged.force);
        assert_eq!(merged.seq, 2);
        assert!(Arc::ptr_eq(&merged.config, &new));
        assert!(merged.active.is_some());
    }
}
