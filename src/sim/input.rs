//! Per-tick input snapshot
//!
//! Raw key and pointer capture belongs to the shell; the simulation only sees
//! which logical actions are held this tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::KindTag;
use super::state::GameSession;

/// Enemies closer than this make the autopilot back off
const AUTOPILOT_DANGER_RADIUS: f32 = 120.0;
/// Axis component needed before the autopilot presses a key
const AUTOPILOT_DEAD_ZONE: f32 = 0.3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Aim position in world units
    pub aim: Vec2,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode: the autopilot drives instead
    pub autopilot: bool,
}

impl InputState {
    /// Unit movement direction (zero when idle or opposite keys cancel)
    pub fn direction(&self) -> Vec2 {
        let x = self.right as i32 - self.left as i32;
        let y = self.down as i32 - self.up as i32;
        Vec2::new(x as f32, y as f32).normalize_or_zero()
    }

    fn press_toward(&mut self, dir: Vec2) {
        self.right = dir.x > AUTOPILOT_DEAD_ZONE;
        self.left = dir.x < -AUTOPILOT_DEAD_ZONE;
        self.down = dir.y > AUTOPILOT_DEAD_ZONE;
        self.up = dir.y < -AUTOPILOT_DEAD_ZONE;
    }
}

/// Demo driver: aim at the nearest enemy, back away from close ones,
/// otherwise collect XP and drift home
pub fn autopilot(session: &GameSession) -> InputState {
    let mut input = InputState::default();
    let store = session.store();
    let Some(player) = store.get(session.player_id()) else {
        return input;
    };
    let pos = player.pos;
    input.aim = pos + Vec2::X;

    let enemy = store.nearest(KindTag::Enemy, pos);
    if let Some(enemy) = enemy {
        input.aim = enemy.pos;
        if enemy.pos.distance(pos) < AUTOPILOT_DANGER_RADIUS {
            input.press_toward((pos - enemy.pos).normalize_or_zero());
            return input;
        }
    }

    if let Some(orb) = store.nearest(KindTag::Pickup, pos) {
        input.press_toward((orb.pos - pos).normalize_or_zero());
        return input;
    }

    let home = match session.objective_id().and_then(|id| store.position_of(id)) {
        Some(objective) => objective + Vec2::new(0.0, AUTOPILOT_DANGER_RADIUS * 0.5),
        None => session.bounds().center(),
    };
    if home.distance(pos) > AUTOPILOT_DANGER_RADIUS {
        input.press_toward((home - pos).normalize_or_zero());
    }
    input
}
