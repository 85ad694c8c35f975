//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable timestep, clamped and scaled against the reference frame
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod cooldown;
pub mod entity;
pub mod events;
pub mod input;
pub mod movement;
pub mod progression;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod store;
pub mod tick;
pub mod upgrade;
pub mod weapon;

pub use clock::{FrameClock, clamp_delta};
pub use collision::{CollisionPair, CollisionResolver, HitRule, apply_strike, circles_overlap};
pub use cooldown::CooldownGate;
pub use entity::{
    DamageOutcome, EdgePolicy, Entity, EntityId, EntityKind, Invulnerability, KindTag, Motion, Tags,
    Vitals,
};
pub use events::GameEvent;
pub use input::{InputState, autopilot};
pub use movement::{WorldBounds, advance};
pub use progression::{Encounter, EnemyStats, ProgressionState};
pub use snapshot::{EntityView, Snapshot};
pub use state::{GamePhase, GameSession, Outcome};
pub use store::EntityStore;
pub use tick::tick;
pub use upgrade::Upgrade;
pub use weapon::{AimMode, FireContext, Weapon, WeaponId, WeaponKind, fire_weapons, offer_weapons};
