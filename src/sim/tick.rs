//! Variable timestep simulation tick
//!
//! One call advances a running session by the clamped delta: steer, move,
//! spawn, attack, collide, then feed the resulting events through death
//! effects and progression before checking for the end of the run.

use std::collections::VecDeque;

use super::clock::clamp_delta;
use super::entity::{EntityId, EntityKind, KindTag, Motion};
use super::events::GameEvent;
use super::input::{InputState, autopilot};
use super::movement::advance;
use super::progression::Encounter;
use super::spawn;
use super::state::{GamePhase, GameSession};
use super::store::EntityStore;
use super::weapon::{FireContext, fire_weapons};
use crate::tuning::WaveMode;

/// Advance the session by `delta_ms`; returns everything that happened
pub fn tick(session: &mut GameSession, input: &InputState, delta_ms: f32) -> Vec<GameEvent> {
    // Handle pause toggle
    if input.pause {
        match session.phase {
            GamePhase::Running => {
                session.pause();
                return Vec::new();
            }
            GamePhase::Paused => session.resume(),
            _ => {}
        }
    }

    match session.phase {
        GamePhase::Running => {}
        GamePhase::Ended(_) => {
            log::warn!("Tick on an ended session ignored");
            return Vec::new();
        }
        GamePhase::NotStarted | GamePhase::Paused => return Vec::new(),
    }

    let delta = clamp_delta(delta_ms, session.tuning.frame.max_delta_ms);
    let reference_frame_ms = session.tuning.frame.reference_frame_ms;
    let input = if input.autopilot {
        autopilot(session)
    } else {
        input.clone()
    };

    steer_player(session, &input);
    decay_invulnerability(&mut session.store, delta);

    let bounds = session.bounds();
    advance(&mut session.store, delta, &bounds, reference_frame_ms);

    let mut events = run_spawners(session, delta);
    events.extend(run_weapons(session, &input, delta));
    events.extend(session.resolver.resolve(&mut session.store));

    let mut events = process_events(session, events);
    if let Some(game_over) = check_end(session) {
        events.push(game_over);
    }

    session.store.sweep();
    session.time_ticks += 1;
    events
}

/// Player velocity comes straight from the held directions
fn steer_player(session: &mut GameSession, input: &InputState) {
    let player_id = session.player_id();
    let Some(player) = session.store.get_mut(player_id) else {
        return;
    };
    let speed = match &player.kind {
        EntityKind::Player(data) => data.speed,
        _ => return,
    };
    player.motion = Motion::Linear {
        vel: input.direction() * speed,
    };
}

fn decay_invulnerability(store: &mut EntityStore, delta_ms: f32) {
    for entity in store.iter_mut() {
        if let Some(invulnerability) = entity.kind.invulnerability_mut() {
            invulnerability.tick(delta_ms);
        }
    }
}

fn run_spawners(session: &mut GameSession, delta_ms: f32) -> Vec<GameEvent> {
    if let Encounter::BossActive(id) = session.progression.encounter
        && session.store.position_of(id).is_none()
    {
        // Consumed on contact rather than killed: no reward
        log::info!("Boss {} left the field without being defeated", id);
        session.progression.encounter = Encounter::Normal;
    }

    match session.tuning.mode {
        WaveMode::Stream => run_stream(session, delta_ms),
        WaveMode::Floors => run_floors(session),
    }
}

/// Timer-driven trickle; the boss replaces it while an encounter is on
fn run_stream(session: &mut GameSession, delta_ms: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    match session.progression.encounter {
        Encounter::Normal => {
            if let Err(err) = session
                .spawn_gate
                .set_threshold(session.progression.spawn_interval_ms)
            {
                log::warn!("Spawn interval rejected: {}", err);
            }
            if session.spawn_gate.tick(delta_ms) {
                spawn_regular(session);
            }
        }
        Encounter::BossPending => {
            if session.store.count(KindTag::Enemy) == 0 {
                events.extend(spawn_boss(session));
            }
        }
        Encounter::BossActive(_) => {}
    }
    events
}

/// Next floor once the field is clear
fn run_floors(session: &mut GameSession) -> Vec<GameEvent> {
    if session.store.count(KindTag::Enemy) > 0 {
        return Vec::new();
    }
    session.progression.floor += 1;
    let floor = session.progression.floor;
    log::info!("Floor {}", floor);
    let mut events = vec![GameEvent::FloorReached { floor }];

    if session.progression.is_boss_floor(&session.tuning.progression) {
        events.extend(spawn_boss(session));
    } else {
        for _ in 0..spawn::floor_enemy_count(&session.tuning, floor) {
            spawn_regular(session);
        }
    }
    events
}

fn spawn_regular(session: &mut GameSession) {
    let stats = session.progression.enemy_stats(&session.tuning.enemies);
    let target = session.enemy_target();
    if let Err(err) = spawn::spawn_enemy(
        &mut session.store,
        &mut session.rng,
        &session.tuning,
        &stats,
        target,
    ) {
        log::warn!("Enemy spawn failed: {}", err);
    }
}

fn spawn_boss(session: &mut GameSession) -> Option<GameEvent> {
    let stats = session
        .progression
        .boss_stats(&session.tuning.enemies, &session.tuning.boss);
    let target = session.enemy_target();
    match spawn::spawn_boss(
        &mut session.store,
        &mut session.rng,
        &session.tuning,
        &stats,
        target,
    ) {
        Ok(id) => {
            log::info!("Boss {} spawned with {} health", id, stats.health);
            Some(GameEvent::BossSpawned {
                id,
                level: session.progression.level,
            })
        }
        Err(err) => {
            log::warn!("Boss spawn failed: {}", err);
            None
        }
    }
}

fn run_weapons(session: &mut GameSession, input: &InputState, delta_ms: f32) -> Vec<GameEvent> {
    let owner = session.player_id();
    let Some(origin) = session.store.position_of(owner) else {
        return Vec::new();
    };
    let ctx = FireContext {
        owner,
        origin,
        aim: session.tuning.aim,
        aim_point: input.aim,
        reference_frame_ms: session.tuning.frame.reference_frame_ms,
    };

    let Some(mut weapons) = session
        .player_data_mut()
        .map(|p| std::mem::take(&mut p.weapons))
    else {
        return Vec::new();
    };
    let events = fire_weapons(&mut session.store, &mut weapons, &ctx, delta_ms);
    if let Some(player) = session.player_data_mut() {
        player.weapons = weapons;
    }
    events
}

/// Death effects and progression, follow-ups handled in order
fn process_events(session: &mut GameSession, events: Vec<GameEvent>) -> Vec<GameEvent> {
    let mut queue: VecDeque<GameEvent> = events.into();
    let mut processed = Vec::with_capacity(queue.len());

    while let Some(event) = queue.pop_front() {
        if let GameEvent::Died { id, kind, pos, .. } = &event {
            death_effects(session, *id, *kind, *pos);
        }
        queue.extend(
            session
                .progression
                .on_event(&event, &session.tuning.progression),
        );
        processed.push(event);
    }
    processed
}

fn death_effects(session: &mut GameSession, id: EntityId, kind: KindTag, pos: glam::Vec2) {
    if kind == KindTag::Enemy {
        let xp = match session.store.get(id).map(|e| &e.kind) {
            Some(EntityKind::Enemy(enemy)) => enemy.xp_value,
            _ => session.tuning.enemies.xp_per_kill,
        };
        let player = session.player_id();
        if xp > 0
            && let Err(err) = spawn::spawn_xp_orb(&mut session.store, pos, xp, player, &session.tuning)
        {
            log::warn!("XP orb not dropped: {}", err);
        }
    }

    if let Err(err) = spawn::spawn_death_particles(
        &mut session.store,
        &mut session.rng,
        pos,
        kind,
        session.tuning.death_particles,
    ) {
        log::warn!("Death particles not spawned: {}", err);
    }
}

fn is_down(store: &EntityStore, id: EntityId) -> bool {
    store
        .get(id)
        .and_then(|e| e.kind.vitals())
        .is_none_or(|v| v.is_dead())
}

/// Loss beats a simultaneous win
fn check_end(session: &mut GameSession) -> Option<GameEvent> {
    let lost = is_down(&session.store, session.player_id())
        || session
            .objective_id()
            .is_some_and(|id| is_down(&session.store, id));

    let progression = &session.progression;
    let won = session
        .tuning
        .win_level
        .is_some_and(|level| progression.level >= level)
        || session
            .tuning
            .win_floor
            .is_some_and(|floor| progression.floor >= floor);

    if !lost && !won {
        return None;
    }
    let outcome = session.end(!lost);
    Some(GameEvent::GameOver {
        win: outcome.win,
        final_level: outcome.final_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_MS;
    use crate::sim::collision::apply_strike;
    use crate::sim::entity::{EnemyData, Entity, PickupData};
    use crate::tuning::Tuning;
    use glam::Vec2;

    const FRAME: f32 = 16.0;

    /// Stream layout with the spawn timer effectively off
    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::obelisk();
        tuning.progression.spawn_interval_ms = 1.0e9;
        tuning
    }

    fn running(tuning: Tuning) -> GameSession {
        let mut session = GameSession::new(12345, tuning).unwrap();
        session.start();
        session
    }

    fn add_enemy(session: &mut GameSession, pos: Vec2, health: f32, contact: f32) -> EntityId {
        let enemy = Entity::new(
            EntityKind::Enemy(EnemyData::new(health, contact, 3).unwrap()),
            pos,
            12.0,
        )
        .unwrap();
        session.store.add(enemy)
    }

    fn objective_health(session: &GameSession) -> f32 {
        let id = session.objective_id().unwrap();
        session.store().get(id).unwrap().kind.vitals().unwrap().health
    }

    #[test]
    fn test_tick_requires_running() {
        let mut session = GameSession::new(1, quiet_tuning()).unwrap();
        assert!(tick(&mut session, &InputState::default(), FRAME).is_empty());
        assert_eq!(session.tick_count(), 0);
        session.start();
        tick(&mut session, &InputState::default(), FRAME);
        assert_eq!(session.tick_count(), 1);
    }

    #[test]
    fn test_tick_pause() {
        let mut session = running(quiet_tuning());
        let toggle = InputState {
            pause: true,
            ..Default::default()
        };
        tick(&mut session, &toggle, FRAME);
        assert_eq!(session.phase(), GamePhase::Paused);

        let before = session.store().get(session.player_id()).unwrap().pos;
        let held = InputState {
            right: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut session, &held, FRAME);
        }
        assert_eq!(session.store().get(session.player_id()).unwrap().pos, before);
        assert_eq!(session.tick_count(), 0);

        tick(&mut session, &toggle, FRAME);
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.tick_count(), 1);
        let player = session.store().get(session.player_id()).unwrap();
        assert!(player.kind.is_invulnerable());
    }

    #[test]
    fn test_tick_delta_is_clamped() {
        let mut session = running(quiet_tuning());
        let before = session.store().get(session.player_id()).unwrap().pos;
        let input = InputState {
            right: true,
            ..Default::default()
        };
        tick(&mut session, &input, 5_000.0);
        let moved = session.store().get(session.player_id()).unwrap().pos.x - before.x;
        let max = 2.0 * 32.0 / REFERENCE_FRAME_MS;
        assert!((moved - max).abs() < 1e-3);
    }

    #[test]
    fn test_tick_end_to_end_contact() {
        let mut session = running(quiet_tuning());
        let objective = session.objective_id().unwrap();
        let centre = session.store().get(objective).unwrap().pos;
        // 0.3 units per ms-scaled step = 0.5 per reference frame
        let enemy_id = {
            let enemy = Entity::new(
                EntityKind::Enemy(EnemyData::new(1.0, 1.0f32.round(), 3).unwrap()),
                centre + Vec2::new(100.0, 0.0),
                12.0,
            )
            .unwrap()
            .with_motion(Motion::seek(objective, 0.5))
            .unwrap();
            session.store.add(enemy)
        };
        // Aim away so the starting weapon does not interfere
        let input = InputState {
            aim: Vec2::new(0.0, 600.0),
            ..Default::default()
        };

        let mut ticks = 0;
        while session.store().get(enemy_id).is_some() && ticks < 500 {
            tick(&mut session, &input, FRAME);
            ticks += 1;
        }

        // 58 units to close at 0.48 per tick
        assert!(ticks > 100 && ticks < 200, "took {} ticks", ticks);
        assert_eq!(objective_health(&session), 9.0);
        assert_eq!(session.phase(), GamePhase::Running);
    }

    #[test]
    fn test_tick_kill_drops_xp_orb_that_gets_collected() {
        let mut session = running(quiet_tuning());
        let player_pos = session.store().get(session.player_id()).unwrap().pos;
        let target = player_pos + Vec2::new(60.0, 0.0);
        add_enemy(&mut session, target, 1.0, 1.0);
        let input = InputState {
            aim: target,
            ..Default::default()
        };

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(tick(&mut session, &input, FRAME));
        }
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Died {
                kind: KindTag::Enemy,
                ..
            }
        )));
        assert!(events.contains(&GameEvent::XpGained { amount: 3 }));
        assert_eq!(session.progression().xp, 3);
        assert_eq!(session.store().count(KindTag::Pickup), 0);
    }

    #[test]
    fn test_tick_boss_flow() {
        let mut session = running(quiet_tuning());
        session.progression.encounter = Encounter::BossPending;
        let events = tick(&mut session, &InputState::default(), FRAME);
        let Some(GameEvent::BossSpawned { id, .. }) = events
            .iter()
            .find(|e| matches!(e, GameEvent::BossSpawned { .. }))
            .cloned()
        else {
            panic!("boss did not spawn");
        };
        assert_eq!(session.progression().encounter, Encounter::BossActive(id));
        let boss = session.store().get(id).unwrap();
        assert!(boss.is_boss());
        assert_eq!(boss.radius, 30.0);
        assert_eq!(boss.kind.vitals().unwrap().max_health, 10.0);

        // Normal spawns stay off during the fight
        assert_eq!(session.store().count(KindTag::Enemy), 1);

        let strike = apply_strike(&mut session.store, id, 1.0e6);
        let events = process_events(&mut session, strike);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BossDefeated { .. })));
        assert_eq!(session.progression().enemy_health_multiplier, 2.0);
        assert_eq!(session.progression().encounter, Encounter::Normal);
        // Boss drops its own XP value
        assert_eq!(session.store().count(KindTag::Pickup), 1);
    }

    #[test]
    fn test_tick_objective_destroyed_ends_run() {
        let mut session = running(quiet_tuning());
        let objective = session.objective_id().unwrap();
        let centre = session.store().get(objective).unwrap().pos;
        if let Some(vitals) = session
            .store
            .get_mut(objective)
            .and_then(|e| e.kind.vitals_mut())
        {
            vitals.health = 1.0;
        }
        add_enemy(&mut session, centre + Vec2::new(0.0, -20.0), 1.0, 1.0);

        let events = tick(&mut session, &InputState::default(), FRAME);
        assert!(events.contains(&GameEvent::GameOver {
            win: false,
            final_level: 1
        }));
        assert!(session.is_over());

        let ticks = session.tick_count();
        assert!(tick(&mut session, &InputState::default(), FRAME).is_empty());
        assert_eq!(session.tick_count(), ticks);
    }

    #[test]
    fn test_tick_win_level() {
        let mut tuning = quiet_tuning();
        tuning.win_level = Some(2);
        let mut session = running(tuning);
        let pos = session.store().get(session.player_id()).unwrap().pos;
        let orb = Entity::new(EntityKind::Pickup(PickupData { xp: 10 }), pos, 5.0).unwrap();
        session.store.add(orb);

        let events = tick(&mut session, &InputState::default(), FRAME);
        assert!(events.contains(&GameEvent::LeveledUp { level: 2 }));
        assert!(events.contains(&GameEvent::GameOver {
            win: true,
            final_level: 2
        }));
        assert_eq!(session.outcome().map(|o| o.win), Some(true));
    }

    #[test]
    fn test_tick_floors_spawn_when_clear() {
        let mut session = running(Tuning::dungeon());
        let events = tick(&mut session, &InputState::default(), FRAME);
        assert!(events.contains(&GameEvent::FloorReached { floor: 1 }));
        assert_eq!(session.store().count(KindTag::Enemy), 3);

        tick(&mut session, &InputState::default(), FRAME);
        assert_eq!(session.progression().floor, 1);
    }

    #[test]
    fn test_tick_floors_boss_rammed_clears_encounter() {
        let mut session = running(Tuning::dungeon());
        session.progression.floor = session.tuning.progression.boss_interval - 1;
        let events = tick(&mut session, &InputState::default(), FRAME);
        let Some(&GameEvent::BossSpawned { id, .. }) = events
            .iter()
            .find(|e| matches!(e, GameEvent::BossSpawned { .. }))
        else {
            panic!("boss floor did not spawn a boss");
        };
        assert_eq!(session.progression().encounter, Encounter::BossActive(id));

        let player = session.player_id();
        let spot = session.store().get(player).unwrap().pos;
        if let Some(vitals) = session.store.get_mut(player).and_then(|e| e.kind.vitals_mut()) {
            vitals.health = 1.0e6;
            vitals.max_health = 1.0e6;
        }
        session.store.get_mut(id).unwrap().pos = spot;

        let mut events = tick(&mut session, &InputState::default(), FRAME);
        events.extend(tick(&mut session, &InputState::default(), FRAME));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::BossDefeated { .. })));
        assert_eq!(session.progression().encounter, Encounter::Normal);
        assert!(!session.snapshot().boss_fight);
        // The next floor follows once the field is empty
        assert_eq!(session.progression().floor, session.tuning.progression.boss_interval + 1);
    }

    #[test]
    fn test_tick_deterministic_with_seed() {
        let run = || {
            let mut session = GameSession::new(777, Tuning::obelisk()).unwrap();
            session.start();
            let input = InputState {
                autopilot: true,
                ..Default::default()
            };
            for _ in 0..600 {
                tick(&mut session, &input, FRAME);
            }
            serde_json::to_string(&session.snapshot()).unwrap()
        };
        assert_eq!(run(), run());
    }
}
