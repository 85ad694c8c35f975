//! Cooldown gates for weapons and spawn timers
//!
//! A gate accumulates elapsed time and fires once the threshold is reached,
//! then starts over from zero. A single `tick` fires at most once no matter
//! how large the delta is: time beyond the threshold is dropped, not banked.
//! Callers that want burst catch-up must loop themselves.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, non_negative};

/// Repeating timer that permits an action once per interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownGate {
    threshold_ms: f32,
    elapsed_ms: f32,
}

impl CooldownGate {
    /// Gate that first fires after a full interval
    pub fn new(threshold_ms: f32) -> Result<Self, ConfigError> {
        let threshold_ms = non_negative("cooldown threshold", threshold_ms)?;
        Ok(Self {
            threshold_ms,
            elapsed_ms: 0.0,
        })
    }

    /// Gate that fires on its very first tick (weapons ready on equip)
    pub fn primed(threshold_ms: f32) -> Result<Self, ConfigError> {
        let mut gate = Self::new(threshold_ms)?;
        gate.elapsed_ms = gate.threshold_ms;
        Ok(gate)
    }

    /// Advance by `delta_ms`; returns true (and resets) when the threshold is crossed
    pub fn tick(&mut self, delta_ms: f32) -> bool {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.elapsed_ms += delta_ms;
        }
        if self.elapsed_ms >= self.threshold_ms {
            self.elapsed_ms = 0.0;
            true
        } else {
            false
        }
    }

    /// Accumulate without firing; a ready gate stays ready until the next `tick`
    pub fn charge(&mut self, delta_ms: f32) {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.elapsed_ms = (self.elapsed_ms + delta_ms).min(self.threshold_ms.max(self.elapsed_ms));
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.elapsed_ms >= self.threshold_ms
    }

    /// Change the interval (fire-rate upgrades); applies on the next check
    pub fn set_threshold(&mut self, threshold_ms: f32) -> Result<(), ConfigError> {
        self.threshold_ms = non_negative("cooldown threshold", threshold_ms)?;
        Ok(())
    }

    /// Restart the interval without firing
    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
    }

    pub fn threshold_ms(&self) -> f32 {
        self.threshold_ms
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Fraction of the interval elapsed, 0..=1 (cooldown bars)
    pub fn progress(&self) -> f32 {
        if self.threshold_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.threshold_ms).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fires_on_threshold_and_resets() {
        let mut gate = CooldownGate::new(100.0).unwrap();
        assert!(!gate.tick(60.0));
        assert!(gate.tick(40.0));
        assert_eq!(gate.elapsed_ms(), 0.0);
        assert!(!gate.tick(99.0));
    }

    #[test]
    fn test_large_delta_fires_once() {
        let mut gate = CooldownGate::new(10.0).unwrap();
        assert!(gate.tick(1000.0));
        // Excess is dropped, not banked for the next call
        assert!(!gate.tick(5.0));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert!(matches!(
            CooldownGate::new(-1.0),
            Err(ConfigError::Negative { .. })
        ));
        let mut gate = CooldownGate::new(50.0).unwrap();
        assert!(gate.set_threshold(f32::INFINITY).is_err());
        assert_eq!(gate.threshold_ms(), 50.0);
    }

    #[test]
    fn test_threshold_change_applies_next_check() {
        let mut gate = CooldownGate::new(500.0).unwrap();
        assert!(!gate.tick(300.0));
        gate.set_threshold(250.0).unwrap();
        assert!(gate.tick(0.0));
    }

    #[test]
    fn test_charge_holds_a_ready_shot() {
        let mut gate = CooldownGate::new(100.0).unwrap();
        gate.charge(70.0);
        assert!(!gate.is_ready());
        gate.charge(500.0);
        assert!(gate.is_ready());
        assert_eq!(gate.elapsed_ms(), 100.0);
        assert!(gate.tick(0.0));
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_primed_fires_immediately() {
        let mut gate = CooldownGate::primed(800.0).unwrap();
        assert!(gate.tick(16.0));
        assert!(!gate.tick(16.0));
        assert!((gate.progress() - 0.02).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_small_deltas_fire_floor_of_total(
            threshold in 1.0f32..200.0,
            deltas in prop::collection::vec(0.0f32..1.0, 1..400),
        ) {
            // Deltas are scaled so every one is <= threshold
            let mut gate = CooldownGate::new(threshold).unwrap();
            let mut fires = 0u32;
            let mut since_fire = 0.0f32;
            for d in deltas.iter().map(|d| d * threshold) {
                since_fire += d;
                let fired = gate.tick(d);
                prop_assert_eq!(fired, since_fire >= threshold);
                if fired {
                    fires += 1;
                    since_fire = 0.0;
                }
            }
            let total: f64 = deltas.iter().map(|d| f64::from(d * threshold)).sum();
            prop_assert!(f64::from(fires) <= total / f64::from(threshold) + 0.05);
        }

        #[test]
        fn prop_never_more_than_one_fire_per_tick(
            threshold in 0.0f32..100.0,
            deltas in prop::collection::vec(0.0f32..10_000.0, 1..100),
        ) {
            let mut gate = CooldownGate::new(threshold).unwrap();
            for d in deltas {
                let before = gate.elapsed_ms();
                let fired = gate.tick(d);
                prop_assert_eq!(fired, before + d >= threshold);
                prop_assert!(!fired || gate.elapsed_ms() == 0.0);
                prop_assert!(gate.elapsed_ms() >= 0.0);
            }
        }
    }
}
