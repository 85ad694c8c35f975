//! Frame clock
//!
//! Turns host timestamps (e.g. `requestAnimationFrame` time) into clamped
//! per-tick deltas so a backgrounded tab cannot teleport entities or drain
//! cooldowns when it comes back.

use crate::consts::MAX_DELTA_MS;

/// Clamp a delta to `[0, max_ms]`; NaN and negatives become 0
#[inline]
pub fn clamp_delta(delta_ms: f32, max_ms: f32) -> f32 {
    if delta_ms.is_nan() || delta_ms <= 0.0 {
        0.0
    } else {
        delta_ms.min(max_ms)
    }
}

/// Delta-time source fed with monotonic host timestamps
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_delta_ms: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_DELTA_MS)
    }
}

impl FrameClock {
    pub fn new(max_delta_ms: f32) -> Self {
        Self {
            last_ms: None,
            max_delta_ms,
        }
    }

    /// Clamped time since the previous call (0 on the first call after a reset)
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        let delta = match self.last_ms {
            Some(last) => (now_ms - last) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        clamp_delta(delta, self.max_delta_ms)
    }

    /// Forget the last timestamp (resume after pause)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }

    pub fn max_delta_ms(&self) -> f32 {
        self.max_delta_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_frame_is_zero() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.delta(1234.0), 0.0);
        assert!((clock.delta(1250.5) - 16.5).abs() < 1e-4);
    }

    #[test]
    fn test_background_tab_is_clamped() {
        let mut clock = FrameClock::new(32.0);
        clock.delta(0.0);
        assert_eq!(clock.delta(5_000.0), 32.0);
    }

    #[test]
    fn test_reset_skips_paused_interval() {
        let mut clock = FrameClock::default();
        clock.delta(100.0);
        clock.reset();
        assert_eq!(clock.delta(60_000.0), 0.0);
        assert!((clock.delta(60_016.0) - 16.0).abs() < 1e-3);
    }

    #[test]
    fn test_time_going_backwards_is_zero() {
        let mut clock = FrameClock::default();
        clock.delta(500.0);
        assert_eq!(clock.delta(400.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_in_range(delta in proptest::num::f32::ANY, max in 1.0f32..100.0) {
            let clamped = clamp_delta(delta, max);
            prop_assert!((0.0..=max).contains(&clamped));
        }
    }
}
