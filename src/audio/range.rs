//! Adaptive log-frequency range and centred pitch deviation.

/// Slowly decaying `[min_log, max_log]` envelope of observed log-pitch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeState {
    pub min_log: f32,
    pub max_log: f32,
}

impl RangeState {
    /// Inverted seed: the first observation lands below `min_log` and above
    /// `max_log`, collapsing the range onto it.
    pub const NEUTRAL: RangeState = RangeState {
        min_log: 100.0,
        max_log: 0.0,
    };

    pub fn center_log(&self) -> f32 {
        (self.min_log + self.max_log) / 2.0
    }
}

impl Default for RangeState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Converts raw pitch into a signed deviation from the adaptive centre.
///
/// A new extreme snaps the matching bound; otherwise both bounds creep
/// toward each other by `decay` per observation, so a single outlier does
/// not saturate the range forever. Creep stops at the observation itself,
/// which keeps `min_log <= observation <= max_log` after every update.
#[derive(Clone, Debug)]
pub struct AdaptiveRangeTracker {
    state: RangeState,
    decay: f32,
}

impl AdaptiveRangeTracker {
    pub fn new(decay: f32) -> Self {
        Self::with_state(RangeState::NEUTRAL, decay)
    }

    pub fn with_state(state: RangeState, decay: f32) -> Self {
        Self { state, decay }
    }

    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Feed a detected pitch (Hz) and return `(deviation, freq_log)`.
    ///
    /// Non-positive or non-finite pitches leave the range untouched and
    /// return `None`.
    pub fn observe(&mut self, freq_hz: f32) -> Option<(f32, f32)> {
        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return None;
        }
        let freq_log = freq_hz.ln();

        let s = &mut self.state;
        s.min_log = if freq_log < s.min_log {
            freq_log
        } else {
            (s.min_log * (1.0 + self.decay)).min(freq_log)
        };
        s.max_log = if freq_log > s.max_log {
            freq_log
        } else {
            (s.max_log * (1.0 - self.decay)).max(freq_log)
        };

        let deviation = freq_log - s.center_log();
        Some((deviation, freq_log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_seed_collapses_on_first_observation() {
        let mut tracker = AdaptiveRangeTracker::new(0.001);
        let (deviation, freq_log) = tracker.observe(5.0f32.exp()).unwrap();

        let state = tracker.state();
        assert!((state.min_log - 5.0).abs() < 1e-5);
        assert!((state.max_log - 5.0).abs() < 1e-5);
        assert!((state.center_log() - 5.0).abs() < 1e-5);
        assert!((freq_log - 5.0).abs() < 1e-5);
        assert!(deviation.abs() < 1e-5);
    }

    #[test]
    fn test_rising_pitch_moves_both_bounds_up() {
        let mut tracker = AdaptiveRangeTracker::new(0.001);
        let mut previous = None;

        for i in 0..400 {
            let freq = 120.0 * (1.0 + 0.002 * i as f32);
            let (deviation, _) = tracker.observe(freq).unwrap();
            let state = tracker.state();

            if let Some(RangeState { min_log, max_log }) = previous {
                assert!(state.max_log >= max_log);
                assert!(state.min_log >= min_log);
            }
            // Newest observation is the top of the range
            assert!(deviation >= 0.0);
            previous = Some(state);
        }
    }

    #[test]
    fn test_constant_pitch_converges() {
        let decay = 0.001;
        let mut tracker = AdaptiveRangeTracker::with_state(
            RangeState {
                min_log: 4.0,
                max_log: 7.0,
            },
            decay,
        );
        let target = 220.0f32;

        let mut last = tracker.state();
        for _ in 0..5000 {
            tracker.observe(target).unwrap();
            last = tracker.state();
        }
        tracker.observe(target).unwrap();
        let next = tracker.state();

        let bound = decay * target.ln();
        assert!((next.min_log - last.min_log).abs() <= bound);
        assert!((next.max_log - last.max_log).abs() <= bound);
        assert!((next.center_log() - target.ln()).abs() < 1e-3);
    }

    #[test]
    fn test_center_between_bounds() {
        let mut tracker = AdaptiveRangeTracker::new(0.001);
        for freq in [200.0, 150.0, 400.0, 180.0, 180.0, 320.0, 90.0, 1000.0, 250.0] {
            let (_, freq_log) = tracker.observe(freq).unwrap();
            let s = tracker.state();
            assert!(s.min_log <= freq_log && freq_log <= s.max_log);
            assert!(s.min_log <= s.center_log() && s.center_log() <= s.max_log);
        }
    }

    #[test]
    fn test_no_pitch_leaves_state() {
        let mut tracker = AdaptiveRangeTracker::new(0.001);
        tracker.observe(300.0).unwrap();
        let before = tracker.state();

        assert_eq!(tracker.observe(0.0), None);
        assert_eq!(tracker.observe(-12.0), None);
        assert_eq!(tracker.observe(f32::NAN), None);
        assert_eq!(tracker.state(), before);
    }
}
