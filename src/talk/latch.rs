use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest press that still counts as a tap
pub const TAP_HOLD_MAX: Duration = Duration::from_millis(500);

/// Longest interval between the two key-downs of a double tap
pub const TAP_GAP_MAX: Duration = Duration::from_millis(750);

const HISTORY_LEN: usize = 2;

/// The last two edge instants of one kind, newest first
#[derive(Debug, Clone, Default)]
pub struct EdgeHistory {
    entries: VecDeque<Instant>,
}

impl EdgeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, at: Instant) {
        self.entries.push_front(at);
        self.entries.truncate(HISTORY_LEN);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `0` is the newest entry
    pub fn get(&self, index: usize) -> Option<Instant> {
        self.entries.get(index).copied()
    }

    fn pair(&self) -> Option<(Instant, Instant)> {
        if self.entries.len() != HISTORY_LEN {
            return None;
        }
        Some((self.entries[0], self.entries[1]))
    }
}

/// Whether the last two press/release cycles form a double tap.
///
/// Both presses must be held at most `TAP_HOLD_MAX` and the second press must
/// start within `TAP_GAP_MAX` of the first. Needs two complete cycles.
pub fn is_double_tap(downs: &EdgeHistory, ups: &EdgeHistory) -> bool {
    let (Some((down_new, down_old)), Some((up_new, up_old))) = (downs.pair(), ups.pair()) else {
        return false;
    };

    let first_hold = up_old.saturating_duration_since(down_old);
    let second_hold = up_new.saturating_duration_since(down_new);
    let gap = down_new.saturating_duration_since(down_old);

    first_hold <= TAP_HOLD_MAX && second_hold <= TAP_HOLD_MAX && gap <= TAP_GAP_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn history_keeps_two_newest_first() {
        let t0 = Instant::now();
        let mut history = EdgeHistory::new();
        history.record(t0);
        history.record(t0 + ms(10));
        history.record(t0 + ms(20));

        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0), Some(t0 + ms(20)));
        assert_eq!(history.get(1), Some(t0 + ms(10)));
    }

    #[test]
    fn single_cycle_never_latches() {
        let t0 = Instant::now();
        let mut downs = EdgeHistory::new();
        let mut ups = EdgeHistory::new();
        downs.record(t0);
        ups.record(t0 + ms(100));

        assert!(!is_double_tap(&downs, &ups));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t0 = Instant::now();
        let mut downs = EdgeHistory::new();
        let mut ups = EdgeHistory::new();
        downs.record(t0);
        ups.record(t0 + ms(250));
        downs.record(t0 + ms(750));
        ups.record(t0 + ms(1250));

        assert!(is_double_tap(&downs, &ups));
    }
}
