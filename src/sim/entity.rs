//! Entity model
//!
//! Every live object in a session is an [`Entity`]: shared spatial data
//! (position, collision radius, motion rule, edge policy) plus a kind-specific
//! payload in [`EntityKind`]. Entities refer to each other only by [`EntityId`].

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::weapon::Weapon;
use crate::consts::{HOMING_ANGLE_WEIGHT, HOMING_CONE, HOMING_TURN_RATE};
use crate::error::{ConfigError, non_negative, positive};

/// Stable handle into the entity store (never reused within a session)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    /// Placeholder carried by entities that have not been added to a store yet
    pub const UNASSIGNED: EntityId = EntityId(0);

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload-free entity discriminant (collision pairs, snapshots, events)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Player,
    Enemy,
    Objective,
    Projectile,
    Pickup,
    Particle,
}

/// Capability flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    /// Survives hits and keeps going (one hit per target)
    pub piercing: bool,
    /// Boss encounter entity
    pub boss: bool,
    /// Removed as soon as it leaves the world
    pub removable_offscreen: bool,
}

impl Tags {
    pub fn piercing() -> Self {
        Self {
            piercing: true,
            ..Self::default()
        }
    }

    pub fn boss() -> Self {
        Self {
            boss: true,
            ..Self::default()
        }
    }

    pub fn offscreen() -> Self {
        Self {
            removable_offscreen: true,
            ..Self::default()
        }
    }
}

/// What happens to a non-removable entity that crosses the world edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Reappear at the opposite edge
    Wrap,
    /// Pinned to the edge
    Clamp,
    /// Bounds ignored (edge spawns walking inward)
    #[default]
    Free,
}

/// Result of applying damage to [`Vitals`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageOutcome {
    /// Soaked up by the shield
    pub absorbed: f32,
    /// Subtracted from health
    pub dealt: f32,
    /// Shield reached zero on this hit
    pub shield_broken: bool,
}

/// Health pool with an optional absorbing shield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    /// Remaining shield capacity (0 = no shield)
    pub shield: f32,
}

impl Vitals {
    pub fn new(max_health: f32) -> Result<Self, ConfigError> {
        let max_health = positive("max health", max_health)?;
        Ok(Self {
            health: max_health,
            max_health,
            shield: 0.0,
        })
    }

    pub fn with_shield(mut self, shield: f32) -> Result<Self, ConfigError> {
        self.shield = non_negative("shield", shield)?;
        Ok(self)
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    #[inline]
    pub fn has_shield(&self) -> bool {
        self.shield > 0.0
    }

    /// Shield absorbs up to its capacity, the excess reaches health
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        let amount = amount.max(0.0);
        let mut outcome = DamageOutcome::default();
        let mut remaining = amount;

        if self.has_shield() {
            if remaining < self.shield {
                self.shield -= remaining;
                outcome.absorbed = remaining;
                remaining = 0.0;
            } else {
                outcome.absorbed = self.shield;
                remaining -= self.shield;
                self.shield = 0.0;
                outcome.shield_broken = true;
            }
        }

        self.health -= remaining;
        outcome.dealt = remaining;
        outcome
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
    }

    /// Raise max health and heal by the same amount
    pub fn grow(&mut self, amount: f32) {
        let amount = amount.max(0.0);
        self.max_health += amount;
        self.health += amount;
    }

    pub fn fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}

/// Timed or permanent damage immunity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invulnerability {
    pub remaining_ms: f32,
    pub permanent: bool,
}

impl Invulnerability {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.permanent || self.remaining_ms > 0.0
    }

    /// Extend immunity to at least `ms` from now
    pub fn grant(&mut self, ms: f32) {
        if ms.is_finite() {
            self.remaining_ms = self.remaining_ms.max(ms);
        }
    }

    pub fn tick(&mut self, delta_ms: f32) {
        if self.remaining_ms > 0.0 {
            self.remaining_ms = (self.remaining_ms - delta_ms).max(0.0);
        }
    }
}

/// Sinusoidal radius wobble for orbiting blades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    pub amplitude: f32,
    /// Radians per millisecond
    pub frequency: f32,
    pub elapsed_ms: f32,
}

/// Per-tick motion rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Static,
    /// Constant velocity in units per reference frame
    Linear { vel: Vec2 },
    /// Walk toward another entity; `heading` is reused when the target vanishes
    Seek {
        target: EntityId,
        speed: f32,
        heading: Vec2,
    },
    /// Heat-seeking projectile steering inside a cone around its launch angle
    Homing {
        heading: f32,
        speed: f32,
        launch_angle: f32,
        cone: f32,
        turn_rate: f32,
        angle_weight: f32,
    },
    /// Circle another entity; `angular_speed` in radians per millisecond
    Orbit {
        center: EntityId,
        radius: f32,
        angular_speed: f32,
        phase: f32,
        oscillation: Option<Oscillation>,
    },
    /// Drift toward a target once inside `range` (XP magnet)
    Attract {
        target: EntityId,
        range: f32,
        pull: f32,
    },
}

impl Motion {
    pub fn seek(target: EntityId, speed: f32) -> Self {
        Motion::Seek {
            target,
            speed,
            heading: Vec2::ZERO,
        }
    }

    /// Homing with the standard cone, weight and turn rate
    pub fn homing(angle: f32, speed: f32) -> Self {
        Motion::Homing {
            heading: angle,
            speed,
            launch_angle: angle,
            cone: HOMING_CONE,
            turn_rate: HOMING_TURN_RATE,
            angle_weight: HOMING_ANGLE_WEIGHT,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Motion::Static => {}
            Motion::Linear { vel } => {
                if !vel.is_finite() {
                    return Err(ConfigError::NotFinite { what: "velocity" });
                }
            }
            Motion::Seek { speed, .. } => {
                non_negative("seek speed", *speed)?;
            }
            Motion::Homing {
                speed,
                cone,
                turn_rate,
                angle_weight,
                ..
            } => {
                non_negative("homing speed", *speed)?;
                non_negative("homing cone", *cone)?;
                non_negative("homing turn rate", *turn_rate)?;
                non_negative("homing angle weight", *angle_weight)?;
            }
            Motion::Orbit {
                radius,
                angular_speed,
                ..
            } => {
                non_negative("orbit radius", *radius)?;
                if !angular_speed.is_finite() {
                    return Err(ConfigError::NotFinite {
                        what: "orbit angular speed",
                    });
                }
            }
            Motion::Attract { range, pull, .. } => {
                non_negative("attract range", *range)?;
                non_negative("attract pull", *pull)?;
            }
        }
        Ok(())
    }
}

/// Player payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerData {
    pub vitals: Vitals,
    pub invulnerability: Invulnerability,
    /// Units per reference frame
    pub speed: f32,
    pub weapons: Vec<Weapon>,
    /// Range at which XP orbs start drifting toward the player
    pub magnet_range: f32,
}

/// Enemy payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyData {
    pub vitals: Vitals,
    /// Dealt once on contact, already scaled and rounded at spawn
    pub contact_damage: f32,
    pub xp_value: u32,
}

impl EnemyData {
    pub fn new(max_health: f32, contact_damage: f32, xp_value: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            vitals: Vitals::new(max_health)?,
            contact_damage: non_negative("contact damage", contact_damage)?,
            xp_value,
        })
    }
}

/// Defended objective payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveData {
    pub vitals: Vitals,
    pub invulnerability: Invulnerability,
}

/// Projectile payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileData {
    pub damage: f32,
    /// Targets already damaged (piercing projectiles hit each target once)
    pub hits: BTreeSet<EntityId>,
    /// Index of the player weapon that owns this projectile, for orbit blades
    pub weapon_slot: Option<usize>,
}

impl ProjectileData {
    pub fn new(damage: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            damage: non_negative("projectile damage", damage)?,
            hits: BTreeSet::new(),
            weapon_slot: None,
        })
    }
}

/// Collectible payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupData {
    pub xp: u32,
}

/// Visual-only debris
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleData {
    /// Kind of entity whose death produced this particle (colour lookup)
    pub source: KindTag,
}

/// Kind-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Player(PlayerData),
    Enemy(EnemyData),
    Objective(ObjectiveData),
    Projectile(ProjectileData),
    Pickup(PickupData),
    Particle(ParticleData),
}

impl EntityKind {
    pub fn tag(&self) -> KindTag {
        match self {
            EntityKind::Player(_) => KindTag::Player,
            EntityKind::Enemy(_) => KindTag::Enemy,
            EntityKind::Objective(_) => KindTag::Objective,
            EntityKind::Projectile(_) => KindTag::Projectile,
            EntityKind::Pickup(_) => KindTag::Pickup,
            EntityKind::Particle(_) => KindTag::Particle,
        }
    }

    pub fn vitals(&self) -> Option<&Vitals> {
        match self {
            EntityKind::Player(p) => Some(&p.vitals),
            EntityKind::Enemy(e) => Some(&e.vitals),
            EntityKind::Objective(o) => Some(&o.vitals),
            _ => None,
        }
    }

    pub fn vitals_mut(&mut self) -> Option<&mut Vitals> {
        match self {
            EntityKind::Player(p) => Some(&mut p.vitals),
            EntityKind::Enemy(e) => Some(&mut e.vitals),
            EntityKind::Objective(o) => Some(&mut o.vitals),
            _ => None,
        }
    }

    pub fn invulnerability_mut(&mut self) -> Option<&mut Invulnerability> {
        match self {
            EntityKind::Player(p) => Some(&mut p.invulnerability),
            EntityKind::Objective(o) => Some(&mut o.invulnerability),
            _ => None,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        match self {
            EntityKind::Player(p) => p.invulnerability.is_active(),
            EntityKind::Objective(o) => o.invulnerability.is_active(),
            _ => false,
        }
    }
}

/// A simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    /// Collision circle radius
    pub radius: f32,
    pub motion: Motion,
    pub tags: Tags,
    pub edge: EdgePolicy,
    /// Remaining life; `None` lives until killed or removed
    pub lifetime_ms: Option<f32>,
    /// Flagged for removal at the end of the tick
    pub despawn: bool,
    pub kind: EntityKind,
}

impl Entity {
    /// Validated entity with no motion; the store assigns the id on insert
    pub fn new(kind: EntityKind, pos: Vec2, radius: f32) -> Result<Self, ConfigError> {
        if !pos.is_finite() {
            return Err(ConfigError::NotFinite { what: "position" });
        }
        let radius = positive("radius", radius)?;
        Ok(Self {
            id: EntityId::UNASSIGNED,
            pos,
            radius,
            motion: Motion::Static,
            tags: Tags::default(),
            edge: EdgePolicy::default(),
            lifetime_ms: None,
            despawn: false,
            kind,
        })
    }

    pub fn with_motion(mut self, motion: Motion) -> Result<Self, ConfigError> {
        motion.validate()?;
        self.motion = motion;
        Ok(self)
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_edge(mut self, edge: EdgePolicy) -> Self {
        self.edge = edge;
        self
    }

    pub fn with_lifetime(mut self, lifetime_ms: f32) -> Result<Self, ConfigError> {
        self.lifetime_ms = Some(positive("lifetime", lifetime_ms)?);
        Ok(self)
    }

    #[inline]
    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    /// Not flagged for removal and (if it has health) still above zero
    pub fn is_alive(&self) -> bool {
        !self.despawn && self.kind.vitals().is_none_or(|v| !v.is_dead())
    }

    pub fn is_boss(&self) -> bool {
        self.tags.boss
    }
}
