//! Discrete game events
//!
//! Systems return these instead of invoking callbacks. The shell drains them
//! each frame for sound, floating numbers and menus; progression consumes
//! them inside the tick.

use glam::Vec2;
use serde::Serialize;

use super::entity::{EntityId, KindTag};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Health damage or shield absorption landed on `target`
    DamageDealt {
        target: EntityId,
        kind: KindTag,
        amount: f32,
        absorbed: f32,
    },
    ShieldBroken { target: EntityId },
    /// Health reached zero; the entity leaves the store this tick
    Died {
        id: EntityId,
        kind: KindTag,
        pos: Vec2,
        boss: bool,
    },
    XpGained { amount: u32 },
    LeveledUp { level: u32 },
    BossSpawned { id: EntityId, level: u32 },
    BossDefeated { level: u32 },
    FloorReached { floor: u32 },
    /// Terminal; `final_level` is the persistence collaborator's score
    GameOver { win: bool, final_level: u32 },
}

impl GameEvent {
    pub fn is_game_over(&self) -> bool {
        matches!(self, GameEvent::GameOver { .. })
    }
}
