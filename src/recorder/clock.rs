//! Inter-action delay tracking
//!
//! Discrete actions (buttons, wheel, keys) and pointer moves keep separate
//! cursors: a burst of moves never eats the idle gap between two clicks.

/// Gaps at or below these thresholds are absorbed without a `Sleep` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepThresholds {
    pub action_ms: u64,
    pub move_ms: u64,
}

impl Default for SleepThresholds {
    fn default() -> Self {
        Self {
            action_ms: 50,
            move_ms: 15,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DeltaTimer {
    last_emit: Option<u64>,
    last_move: Option<u64>,
    thresholds: SleepThresholds,
}

impl DeltaTimer {
    pub fn new(thresholds: SleepThresholds) -> Self {
        Self {
            last_emit: None,
            last_move: None,
            thresholds,
        }
    }

    /// Session start. With an anchor both cursors measure from it; without
    /// one the first action and first move carry no gap.
    pub fn start(&mut self, anchor: Option<u64>) {
        self.last_emit = anchor;
        self.last_move = anchor;
    }

    pub fn clear(&mut self) {
        self.last_emit = None;
        self.last_move = None;
    }

    pub fn last_emit(&self) -> Option<u64> {
        self.last_emit
    }

    /// Milliseconds since the previous discrete action, clamped at zero.
    pub fn delta(&mut self, t: u64) -> u64 {
        let gap = self.last_emit.map_or(0, |last| t.saturating_sub(last));
        self.last_emit = Some(t);
        // Moves after this action measure from it
        self.last_move = Some(t);
        gap
    }

    /// Milliseconds since the previous move (or discrete action).
    pub fn move_delta(&mut self, t: u64) -> u64 {
        let gap = self.last_move.map_or(0, |last| t.saturating_sub(last));
        self.last_move = Some(t);
        gap
    }

    /// Gap to record as a `Sleep`, if it is significant.
    pub fn significant_delay(&mut self, t: u64, is_move: bool) -> Option<u64> {
        let (gap, threshold) = if is_move {
            (self.move_delta(t), self.thresholds.move_ms)
        } else {
            (self.delta(t), self.thresholds.action_ms)
        };
        (gap > threshold).then_some(gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_delta_clamps_to_zero() {
        let mut clock = DeltaTimer::default();
        clock.start(Some(100));
        assert_eq!(clock.delta(80), 0);
        assert_eq!(clock.last_emit(), Some(80));
        assert_eq!(clock.delta(130), 50);
    }

    #[test]
    fn test_sub_threshold_gaps_absorbed() {
        let mut clock = DeltaTimer::new(SleepThresholds::default());
        clock.start(Some(0));
        assert_eq!(clock.significant_delay(50, false), None);
        assert_eq!(clock.significant_delay(111, false), Some(61));
        assert_eq!(clock.significant_delay(126, true), None);
        assert_eq!(clock.significant_delay(142, true), Some(16));
    }

    #[test]
    fn test_moves_do_not_advance_action_cursor() {
        let mut clock = DeltaTimer::default();
        clock.start(Some(0));
        clock.move_delta(40);
        clock.move_delta(80);
        assert_eq!(clock.delta(100), 100);
        assert_eq!(clock.move_delta(110), 10);
    }

    #[test]
    fn test_unanchored_start_has_no_leading_gap() {
        let mut clock = DeltaTimer::new(SleepThresholds::default());
        clock.start(None);
        assert_eq!(clock.significant_delay(1000, false), None);
        assert_eq!(clock.significant_delay(1040, false), None);
        assert_eq!(clock.significant_delay(1100, false), Some(60));
    }
}
