/// Time-bounded highlight decay.
///
/// Highlights are keyed by `InstanceIdHash`, so they survive a republish
/// without being restarted: a node keeps counting down from where it was
/// unless the diff marks it just-arrived again.
use crate::settings::Color;
use std::collections::HashMap;
use std::time::Duration;

/// Per-node highlight state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightState {
    Normal,
    Highlighted { remaining: Duration, color: Color },
}

impl HighlightState {
    pub fn is_highlighted(&self) -> bool {
        matches!(self, Self::Highlighted { .. })
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Self::Normal => None,
            Self::Highlighted { color, .. } => Some(*color),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveHighlight {
    remaining: Duration,
    color: Color,
}

/// The set of currently highlighted nodes.
#[derive(Debug, Default)]
pub struct HighlightTracker {
    active: HashMap<u32, ActiveHighlight>,
}

impl HighlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a highlight. A zero duration is a no-op.
    pub fn start(&mut self, instance_id_hash: u32, duration: Duration, color: Color) {
        if duration.is_zero() {
            return;
        }
        self.active.insert(
            instance_id_hash,
            ActiveHighlight {
                remaining: duration,
                color,
            },
        );
    }

    /// Current state of a node.
    pub fn state(&self, instance_id_hash: u32) -> HighlightState {
        match self.active.get(&instance_id_hash) {
            Some(h) => HighlightState::Highlighted {
                remaining: h.remaining,
                color: h.color,
            },
            None => HighlightState::Normal,
        }
    }

    /// Drop highlights for nodes that are no longer in the tree.
    pub fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) {
        self.active.retain(|hash, _| keep(*hash));
    }

    /// Advance every highlight by `elapsed`.
    ///
    /// Returns the hashes whose highlight expired on this tick; they are
    /// back to [`HighlightState::Normal`] afterwards.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<u32> {
        let mut expired = Vec::new();
        self.active.retain(|hash, h| {
            h.remaining = h.remaining.saturating_sub(elapsed);
            if h.remaining.is_zero() {
                expired.push(*hash);
                false
            } else {
                true
            }
        });
        expired.sort_unstable();
        expired
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Color = Color::rgb(0, 200, 0);

    #[test]
    fn test_highlight_decays_to_normal() {
        let mut tracker = HighlightTracker::new();
        tracker.start(7, Duration::from_millis(300), GREEN);

        assert!(tracker.tick(Duration::from_millis(100)).is_empty());
        assert_eq!(
            tracker.state(7),
            HighlightState::Highlighted {
                remaining: Duration::from_millis(200),
                color: GREEN
            }
        );

        assert!(tracker.tick(Duration::from_millis(100)).is_empty());
        assert_eq!(tracker.tick(Duration::from_millis(100)), vec![7]);
        assert_eq!(tracker.state(7), HighlightState::Normal);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_overshooting_tick_expires() {
        let mut tracker = HighlightTracker::new();
        tracker.start(1, Duration::from_millis(50), GREEN);
        assert_eq!(tracker.tick(Duration::from_secs(5)), vec![1]);
    }

    #[test]
    fn test_restart_resets_remaining() {
        let mut tracker = HighlightTracker::new();
        tracker.start(1, Duration::from_millis(100), GREEN);
        tracker.tick(Duration::from_millis(90));
        tracker.start(1, Duration::from_millis(100), GREEN);
        assert!(tracker.tick(Duration::from_millis(90)).is_empty());
    }

    #[test]
    fn test_zero_duration_never_highlights() {
        let mut tracker = HighlightTracker::new();
        tracker.start(1, Duration::ZERO, GREEN);
        assert_eq!(tracker.state(1), HighlightState::Normal);
    }

    #[test]
    fn test_retain_drops_departed_nodes() {
        let mut tracker = HighlightTracker::new();
        tracker.start(1, Duration::from_secs(1), GREEN);
        tracker.start(2, Duration::from_secs(1), GREEN);
        tracker.retain(|hash| hash == 2);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.state(2).is_highlighted());
    }
}
