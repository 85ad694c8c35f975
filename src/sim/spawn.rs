//! Entity templates and spawn placement
//!
//! Enemies enter just outside a random world edge and walk inward, so they
//! use the `Free` edge policy. Death effects (XP orbs and particles) are
//! spawned where the victim died.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{
    EdgePolicy, EnemyData, Entity, EntityId, EntityKind, Invulnerability, KindTag, Motion,
    ObjectiveData, ParticleData, PickupData, PlayerData, Tags, Vitals,
};
use super::movement::WorldBounds;
use super::progression::EnemyStats;
use super::store::EntityStore;
use super::weapon::Weapon;
use crate::error::ConfigError;
use crate::polar_to_cartesian;
use crate::tuning::Tuning;

/// Particle budget; death bursts beyond this are dropped
pub const MAX_PARTICLES: usize = 256;

pub const XP_ORB_RADIUS: f32 = 5.0;

/// Player starts this far below the objective
const PLAYER_OBJECTIVE_OFFSET: f32 = 80.0;

/// Random point just outside one of the four edges
pub fn edge_position(rng: &mut Pcg32, bounds: &WorldBounds, margin: f32) -> Vec2 {
    let x = rng.random_range(bounds.min.x..=bounds.max.x);
    let y = rng.random_range(bounds.min.y..=bounds.max.y);
    match rng.random_range(0..4) {
        0 => Vec2::new(x, bounds.min.y - margin),
        1 => Vec2::new(bounds.max.x + margin, y),
        2 => Vec2::new(x, bounds.max.y + margin),
        _ => Vec2::new(bounds.min.x - margin, y),
    }
}

pub fn spawn_player(store: &mut EntityStore, tuning: &Tuning) -> Result<EntityId, ConfigError> {
    let bounds = WorldBounds::new(tuning.world.width, tuning.world.height);
    let mut pos = bounds.center();
    if tuning.objective.is_some() {
        pos.y = (pos.y + PLAYER_OBJECTIVE_OFFSET).min(bounds.max.y);
    }

    let data = PlayerData {
        vitals: Vitals::new(tuning.player.max_health)?,
        invulnerability: Invulnerability::default(),
        speed: tuning.player.speed,
        weapons: vec![Weapon::from_tuning(&tuning.weapon)?],
        magnet_range: tuning.player.magnet_range,
    };
    let player = Entity::new(EntityKind::Player(data), pos, tuning.player.radius)?
        .with_motion(Motion::Linear { vel: Vec2::ZERO })?
        .with_edge(tuning.player.edge);
    Ok(store.add(player))
}

/// The defended objective, if this layout has one
pub fn spawn_objective(store: &mut EntityStore, tuning: &Tuning) -> Result<Option<EntityId>, ConfigError> {
    let Some(objective) = &tuning.objective else {
        return Ok(None);
    };
    let bounds = WorldBounds::new(tuning.world.width, tuning.world.height);
    let data = ObjectiveData {
        vitals: Vitals::new(objective.max_health)?.with_shield(objective.shield)?,
        invulnerability: Invulnerability::default(),
    };
    let entity = Entity::new(EntityKind::Objective(data), bounds.center(), objective.radius)?;
    Ok(Some(store.add(entity)))
}

fn enemy_entity(stats: &EnemyStats, pos: Vec2, target: EntityId) -> Result<Entity, ConfigError> {
    let data = EnemyData::new(stats.health, stats.contact_damage, stats.xp)?;
    Entity::new(EntityKind::Enemy(data), pos, stats.radius)?
        .with_motion(Motion::seek(target, stats.speed))
        .map(|e| e.with_edge(EdgePolicy::Free))
}

/// Regular enemy at a random edge, walking toward `target`
pub fn spawn_enemy(
    store: &mut EntityStore,
    rng: &mut Pcg32,
    tuning: &Tuning,
    stats: &EnemyStats,
    target: EntityId,
) -> Result<EntityId, ConfigError> {
    let bounds = WorldBounds::new(tuning.world.width, tuning.world.height);
    let pos = edge_position(rng, &bounds, tuning.world.spawn_margin);
    let id = store.add(enemy_entity(stats, pos, target)?);
    log::debug!("Spawned enemy {} at ({:.0}, {:.0})", id, pos.x, pos.y);
    Ok(id)
}

/// Boss enters from the top edge
pub fn spawn_boss(
    store: &mut EntityStore,
    rng: &mut Pcg32,
    tuning: &Tuning,
    stats: &EnemyStats,
    target: EntityId,
) -> Result<EntityId, ConfigError> {
    let bounds = WorldBounds::new(tuning.world.width, tuning.world.height);
    let pos = Vec2::new(
        rng.random_range(bounds.min.x..=bounds.max.x),
        bounds.min.y - stats.radius - tuning.world.spawn_margin,
    );
    let boss = enemy_entity(stats, pos, target)?.with_tags(Tags::boss());
    Ok(store.add(boss))
}

/// XP orb that drifts toward the player once inside its magnet range
pub fn spawn_xp_orb(
    store: &mut EntityStore,
    pos: Vec2,
    xp: u32,
    player: EntityId,
    tuning: &Tuning,
) -> Result<EntityId, ConfigError> {
    let magnet_range = match store.get(player).map(|e| &e.kind) {
        Some(EntityKind::Player(p)) => p.magnet_range,
        _ => tuning.player.magnet_range,
    };
    let orb = Entity::new(EntityKind::Pickup(PickupData { xp }), pos, XP_ORB_RADIUS)?
        .with_motion(Motion::Attract {
            target: player,
            range: magnet_range,
            pull: tuning.player.magnet_pull,
        })?;
    Ok(store.add(orb))
}

/// Short-lived debris flying out from a death
pub fn spawn_death_particles(
    store: &mut EntityStore,
    rng: &mut Pcg32,
    pos: Vec2,
    source: KindTag,
    count: u32,
) -> Result<(), ConfigError> {
    let live = store.count(KindTag::Particle);
    let budget = MAX_PARTICLES.saturating_sub(live).min(count as usize);
    for _ in 0..budget {
        let vel = polar_to_cartesian(rng.random_range(1.0..3.0), rng.random_range(0.0..TAU));
        let particle = Entity::new(
            EntityKind::Particle(ParticleData { source }),
            pos,
            rng.random_range(2.0..4.0),
        )?
        .with_motion(Motion::Linear { vel })?
        .with_lifetime(rng.random_range(300.0..600.0))?
        .with_tags(Tags::offscreen());
        store.add(particle);
    }
    Ok(())
}

/// Floors mode: regular enemies on a non-boss floor
pub fn floor_enemy_count(tuning: &Tuning, floor: u32) -> u32 {
    tuning.enemies.base_floor_enemies + floor / 2
}
