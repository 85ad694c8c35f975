//! Player weapons
//!
//! Each weapon owns a cooldown gate. When the gate fires, the weapon either
//! spawns projectiles (ranged), refreshes its orbiting blades, or strikes
//! the nearest enemy inside its arc (melee). Picking the same weapon again
//! stacks it: `count` copies divide the cooldown, and ranged copies each
//! fire their own volley. `WeaponId` names the catalogue players choose from.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::apply_strike;
use super::cooldown::CooldownGate;
use super::entity::{
    Entity, EntityId, EntityKind, KindTag, Motion, Oscillation, ProjectileData, Tags,
};
use super::events::GameEvent;
use super::store::EntityStore;
use crate::error::{ConfigError, non_negative, positive, within};
use crate::tuning::WeaponTuning;
use crate::{heading_of, normalize_angle, polar_to_cartesian};

/// Oscillating blades swing between 0.4 and 1.2 of the orbit radius
const OSCILLATION_BASE: f32 = 0.8;
const OSCILLATION_AMOUNT: f32 = 0.4;
/// Radians per millisecond
const OSCILLATION_FREQUENCY: f32 = 0.002;

/// Each extra melee copy widens reach and arc by half
const MELEE_STACK_GROWTH: f32 = 0.5;
/// Radians between the volleys of stacked ranged copies
const RANGED_STACK_SPREAD: f32 = 0.1;

/// Where attacks point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimMode {
    /// Toward the input aim position
    #[default]
    Pointer,
    /// Toward the closest live enemy; holds fire while none exist
    NearestEnemy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeaponKind {
    Ranged {
        /// Units per reference frame
        projectile_speed: f32,
        projectile_radius: f32,
        piercing: bool,
        /// Extra projectiles per side of the aim line
        multishot: u32,
        /// Radians between neighbouring projectiles
        spread: f32,
        homing: bool,
        /// Distance travelled before the projectile expires
        range: f32,
    },
    Orbiting {
        orbit_radius: f32,
        blade_radius: f32,
        /// Revolutions per second
        spin_speed: f32,
        oscillating: bool,
    },
    Melee {
        range: f32,
        /// Full swing width in radians
        arc: f32,
    },
}

impl WeaponKind {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            WeaponKind::Ranged {
                projectile_speed,
                projectile_radius,
                spread,
                range,
                ..
            } => {
                positive("projectile speed", *projectile_speed)?;
                positive("projectile radius", *projectile_radius)?;
                non_negative("projectile spread", *spread)?;
                positive("projectile range", *range)?;
            }
            WeaponKind::Orbiting {
                orbit_radius,
                blade_radius,
                spin_speed,
                ..
            } => {
                positive("orbit radius", *orbit_radius)?;
                positive("blade radius", *blade_radius)?;
                if !spin_speed.is_finite() {
                    return Err(ConfigError::NotFinite { what: "spin speed" });
                }
            }
            WeaponKind::Melee { range, arc } => {
                positive("melee range", *range)?;
                within("melee arc", *arc, 0.0, TAU)?;
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeaponKind::Ranged { .. } => "ranged",
            WeaponKind::Orbiting { .. } => "orbiting",
            WeaponKind::Melee { .. } => "melee",
        }
    }

    fn needs_aim(&self) -> bool {
        !matches!(self, WeaponKind::Orbiting { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub damage: f32,
    pub gate: CooldownGate,
    /// Stacked copies
    pub count: u32,
    /// Cooldown of a single copy
    base_cooldown_ms: f32,
}

impl Weapon {
    /// Ready to fire on the first tick
    pub fn new(kind: WeaponKind, damage: f32, cooldown_ms: f32) -> Result<Self, ConfigError> {
        kind.validate()?;
        let damage = non_negative("weapon damage", damage)?;
        let gate = CooldownGate::primed(cooldown_ms)?;
        Ok(Self {
            kind,
            damage,
            gate,
            count: 1,
            base_cooldown_ms: cooldown_ms,
        })
    }

    pub fn from_tuning(tuning: &WeaponTuning) -> Result<Self, ConfigError> {
        Self::new(tuning.kind.clone(), tuning.damage, tuning.cooldown_ms)
    }

    /// Add another copy of this weapon
    pub fn stack(&mut self) -> Result<(), ConfigError> {
        self.count += 1;
        self.sync_threshold()
    }

    /// Multiply the single-copy cooldown (fire-rate upgrades)
    pub fn scale_cooldown(&mut self, factor: f32) -> Result<(), ConfigError> {
        self.base_cooldown_ms = non_negative("weapon cooldown", self.base_cooldown_ms * factor)?;
        self.sync_threshold()
    }

    pub fn base_cooldown_ms(&self) -> f32 {
        self.base_cooldown_ms
    }

    fn sync_threshold(&mut self) -> Result<(), ConfigError> {
        let count = self.count.max(1) as f32;
        self.gate.set_threshold(self.base_cooldown_ms / count)
    }
}

/// Dungeon tile edge; catalogue ranges are multiples of it
const TILE: f32 = 32.0;
/// Chance that a starting offer may include dragon weapons
const DRAGON_START_CHANCE: f64 = 0.05;

/// Named weapons a player can be offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponId {
    Sword,
    Scythe,
    DragonScythe,
    DragonSword,
    PiercingBow,
    DragonBow,
    NatureScythe,
    CrystalScythe,
}

const CATALOGUE: [WeaponId; 8] = [
    WeaponId::Sword,
    WeaponId::Scythe,
    WeaponId::DragonScythe,
    WeaponId::DragonSword,
    WeaponId::PiercingBow,
    WeaponId::DragonBow,
    WeaponId::NatureScythe,
    WeaponId::CrystalScythe,
];

impl WeaponId {
    pub fn catalogue() -> &'static [WeaponId] {
        &CATALOGUE
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeaponId::Sword => "Sword",
            WeaponId::Scythe => "Scythe",
            WeaponId::DragonScythe => "Dragon Scythe",
            WeaponId::DragonSword => "Dragon Sword",
            WeaponId::PiercingBow => "Piercing Bow",
            WeaponId::DragonBow => "Dragon Bow",
            WeaponId::NatureScythe => "Nature Scythe",
            WeaponId::CrystalScythe => "Crystal Scythe",
        }
    }

    /// Rare: kept out of most starting offers
    pub fn is_dragon(&self) -> bool {
        matches!(
            self,
            WeaponId::DragonScythe | WeaponId::DragonSword | WeaponId::DragonBow
        )
    }

    /// Balance entry for this weapon
    pub fn tuning(&self) -> WeaponTuning {
        let melee = |range: f32, damage: f32, cooldown_ms: f32| WeaponTuning {
            kind: WeaponKind::Melee {
                range,
                arc: std::f32::consts::FRAC_PI_3,
            },
            damage,
            cooldown_ms,
        };
        let scythe = |orbit: f32, spin_speed: f32, oscillating: bool, damage: f32, cooldown_ms: f32| {
            WeaponTuning {
                kind: WeaponKind::Orbiting {
                    orbit_radius: orbit,
                    blade_radius: TILE / 2.0,
                    spin_speed,
                    oscillating,
                },
                damage,
                cooldown_ms,
            }
        };
        let bow = |projectile_speed: f32, damage: f32, cooldown_ms: f32| WeaponTuning {
            kind: WeaponKind::Ranged {
                projectile_speed,
                projectile_radius: 15.0,
                piercing: true,
                multishot: 0,
                spread: 0.1,
                homing: false,
                range: TILE * 8.0,
            },
            damage,
            cooldown_ms,
        };

        match self {
            WeaponId::Sword => melee(TILE * 1.5, 25.0, 500.0),
            WeaponId::DragonSword => melee(TILE * 2.0, 40.0, 400.0),
            WeaponId::Scythe => scythe(TILE * 2.5, 1.0, false, 50.0, 200.0),
            WeaponId::DragonScythe => scythe(TILE * 4.0, 2.0, true, 100.0, 150.0),
            WeaponId::NatureScythe => scythe(TILE * 4.0, 1.0, true, 50.0, 200.0),
            WeaponId::CrystalScythe => scythe(TILE * 4.0, 1.0, false, 100.0, 200.0),
            WeaponId::PiercingBow => bow(8.0, 20.0, 800.0),
            WeaponId::DragonBow => bow(12.0, 30.0, 400.0),
        }
    }

    pub fn build(&self) -> Result<Weapon, ConfigError> {
        Weapon::from_tuning(&self.tuning())
    }
}

/// Draw up to `n` distinct catalogue weapons. Starting offers leave out
/// dragon weapons unless a 5% roll lets them in; boss rewards never do.
pub fn offer_weapons(rng: &mut Pcg32, boss_reward: bool, n: usize) -> Vec<WeaponId> {
    let allow_dragons = boss_reward || rng.random_bool(DRAGON_START_CHANCE);
    let pool: Vec<WeaponId> = CATALOGUE
        .iter()
        .copied()
        .filter(|id| allow_dragons || !id.is_dragon())
        .collect();
    pool.choose_multiple(rng, n).copied().collect()
}

/// Shared inputs for one attack pass
#[derive(Debug, Clone, Copy)]
pub struct FireContext {
    pub owner: EntityId,
    pub origin: Vec2,
    pub aim: AimMode,
    /// Input aim position (pointer mode)
    pub aim_point: Vec2,
    pub reference_frame_ms: f32,
}

fn aim_angle(store: &EntityStore, ctx: &FireContext) -> Option<f32> {
    match ctx.aim {
        AimMode::Pointer => Some(heading_of(ctx.aim_point - ctx.origin)),
        AimMode::NearestEnemy => store
            .nearest(KindTag::Enemy, ctx.origin)
            .map(|enemy| heading_of(enemy.pos - ctx.origin)),
    }
}

/// Tick every weapon gate and carry out the attacks that fire
pub fn fire_weapons(
    store: &mut EntityStore,
    weapons: &mut [Weapon],
    ctx: &FireContext,
    delta_ms: f32,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let aim = aim_angle(store, ctx);

    for (slot, weapon) in weapons.iter_mut().enumerate() {
        if let WeaponKind::Orbiting { .. } = weapon.kind {
            sync_blades(store, ctx, slot, weapon);
        }

        if weapon.kind.needs_aim() && aim.is_none() {
            // Nothing to shoot at: keep the shot ready instead of wasting it
            weapon.gate.charge(delta_ms);
            continue;
        }
        if !weapon.gate.tick(delta_ms) {
            continue;
        }

        let angle = aim.unwrap_or(0.0);
        match &weapon.kind {
            WeaponKind::Ranged { .. } => fire_ranged(store, ctx, weapon, angle),
            WeaponKind::Orbiting { .. } => clear_blade_hits(store, ctx.owner, slot),
            WeaponKind::Melee { range, arc } => {
                events.extend(swing(store, ctx, weapon, *range, *arc, angle));
            }
        }
    }

    events
}

/// Spawn the fan of projectiles for one shot, once per stacked copy
fn fire_ranged(store: &mut EntityStore, ctx: &FireContext, weapon: &Weapon, angle: f32) {
    let WeaponKind::Ranged {
        projectile_speed,
        projectile_radius,
        piercing,
        multishot,
        spread,
        homing,
        range,
    } = weapon.kind
    else {
        return;
    };

    let lifetime_ms = range / projectile_speed * ctx.reference_frame_ms;
    let fan = multishot as i32;
    let copies = weapon.count.max(1);
    // One fan per stacked copy, centred on the aim line
    let volleys = (0..copies).map(|c| (c as f32 - (copies - 1) as f32 / 2.0) * RANGED_STACK_SPREAD);
    let shots = volleys.flat_map(|offset| (-fan..=fan).map(move |i| offset + i as f32 * spread));
    for shot_offset in shots {
        let shot_angle = normalize_angle(angle + shot_offset);
        let motion = if homing {
            Motion::homing(shot_angle, projectile_speed)
        } else {
            Motion::Linear {
                vel: polar_to_cartesian(projectile_speed, shot_angle),
            }
        };
        let tags = Tags {
            piercing,
            removable_offscreen: true,
            ..Tags::default()
        };

        let projectile = ProjectileData::new(weapon.damage).and_then(|data| {
            Entity::new(EntityKind::Projectile(data), ctx.origin, projectile_radius)?
                .with_motion(motion)?
                .with_lifetime(lifetime_ms)
        });
        match projectile {
            Ok(entity) => {
                store.add(entity.with_tags(tags));
            }
            Err(err) => log::warn!("Projectile not fired: {}", err),
        }
    }
}

fn is_blade_of(entity: &Entity, owner: EntityId, slot: usize) -> bool {
    let EntityKind::Projectile(data) = &entity.kind else {
        return false;
    };
    data.weapon_slot == Some(slot)
        && matches!(entity.motion, Motion::Orbit { center, .. } if center == owner)
}

/// Keep exactly `count` blades circling the owner, carrying current damage
fn sync_blades(store: &mut EntityStore, ctx: &FireContext, slot: usize, weapon: &Weapon) {
    let WeaponKind::Orbiting {
        orbit_radius,
        blade_radius,
        spin_speed,
        oscillating,
    } = weapon.kind
    else {
        return;
    };

    let live = store
        .iter()
        .filter(|e| e.is_alive() && is_blade_of(e, ctx.owner, slot))
        .count();

    if live == weapon.count as usize {
        for blade in store.iter_mut() {
            if !blade.is_alive() || !is_blade_of(blade, ctx.owner, slot) {
                continue;
            }
            if let EntityKind::Projectile(data) = &mut blade.kind {
                data.damage = weapon.damage;
            }
        }
        return;
    }

    for blade in store.iter_mut() {
        if is_blade_of(blade, ctx.owner, slot) {
            blade.despawn = true;
        }
    }

    let angular_speed = spin_speed * TAU / 1000.0;
    let count = weapon.count.max(1);
    for i in 0..count {
        let phase = i as f32 * TAU / count as f32;
        let (radius, oscillation) = if oscillating {
            (
                orbit_radius * OSCILLATION_BASE,
                Some(Oscillation {
                    amplitude: orbit_radius * OSCILLATION_AMOUNT,
                    frequency: OSCILLATION_FREQUENCY,
                    elapsed_ms: 0.0,
                }),
            )
        } else {
            (orbit_radius, None)
        };
        let motion = Motion::Orbit {
            center: ctx.owner,
            radius,
            angular_speed,
            phase,
            oscillation,
        };

        let blade = ProjectileData::new(weapon.damage).and_then(|mut data| {
            data.weapon_slot = Some(slot);
            Entity::new(
                EntityKind::Projectile(data),
                ctx.origin + polar_to_cartesian(radius, phase),
                blade_radius,
            )?
            .with_motion(motion)
        });
        match blade {
            Ok(entity) => {
                store.add(entity.with_tags(Tags::piercing()));
            }
            Err(err) => log::warn!("Orbit blade not spawned: {}", err),
        }
    }
}

/// New swing: every blade may hit each enemy once more
fn clear_blade_hits(store: &mut EntityStore, owner: EntityId, slot: usize) {
    for blade in store.iter_mut() {
        if !is_blade_of(blade, owner, slot) {
            continue;
        }
        if let EntityKind::Projectile(data) = &mut blade.kind {
            data.hits.clear();
        }
    }
}

/// Strike the nearest enemy inside the swing arc
fn swing(
    store: &mut EntityStore,
    ctx: &FireContext,
    weapon: &Weapon,
    range: f32,
    arc: f32,
    angle: f32,
) -> Vec<GameEvent> {
    let growth = 1.0 + weapon.count.saturating_sub(1) as f32 * MELEE_STACK_GROWTH;
    let reach = range * growth;
    let half_arc = arc * growth / 2.0;

    let target = store
        .iter_kind(KindTag::Enemy)
        .filter(|e| e.is_alive())
        .filter(|e| {
            let offset = e.pos - ctx.origin;
            offset.length() <= reach + e.radius
                && normalize_angle(heading_of(offset) - angle).abs() <= half_arc
        })
        .min_by(|a, b| {
            a.pos
                .distance_squared(ctx.origin)
                .partial_cmp(&b.pos.distance_squared(ctx.origin))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|e| e.id);

    match target {
        Some(id) => apply_strike(store, id, weapon.damage * weapon.count as f32),
        None => Vec::new(),
    }
}
