//! Arena Sim - entity simulation core for wave-survival arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, cooldowns, collisions, progression)
//! - `tuning`: Data-driven game balance and difficulty presets
//! - `platform`: Logging bootstrap and the browser bridge
//! - `error`: Configuration errors raised at creation time

pub mod error;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use tuning::{DifficultyPreset, Tuning};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Nominal frame duration that speed constants were tuned against (60 FPS)
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest delta a single tick will consume (tab switches, slow frames)
    pub const MAX_DELTA_MS: f32 = 32.0;

    /// Default world dimensions
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;
    /// Distance outside the world edge at which enemies appear
    pub const SPAWN_MARGIN: f32 = 20.0;

    /// Homing defaults - steer only inside a ±45° cone of the launch angle
    pub const HOMING_CONE: f32 = std::f32::consts::FRAC_PI_4;
    pub const HOMING_ANGLE_WEIGHT: f32 = 2.0;
    /// Fraction of the heading error corrected per tick
    pub const HOMING_TURN_RATE: f32 = 0.03;

    /// Progression defaults
    pub const XP_GROWTH: f32 = 1.4;
    pub const BOSS_INTERVAL: u32 = 5;
    pub const BOSS_DIFFICULTY_FACTOR: f32 = 2.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of a direction vector (radians, atan2 convention)
#[inline]
pub fn heading_of(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}
