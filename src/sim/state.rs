//! Game session and loop phase
//!
//! A `GameSession` owns everything a run needs: tuning, RNG, entity store,
//! progression and the loop phase. There is no global state; starting over
//! means building a new session.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::collision::CollisionResolver;
use super::cooldown::CooldownGate;
use super::entity::{EntityId, EntityKind, Motion, PlayerData};
use super::movement::WorldBounds;
use super::progression::ProgressionState;
use super::snapshot::Snapshot;
use super::spawn;
use super::store::EntityStore;
use super::upgrade::Upgrade;
use super::weapon::{self, Weapon, WeaponId};
use crate::error::ConfigError;
use crate::tuning::Tuning;

/// Terminal result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub win: bool,
    /// Score handed to the high-score collaborator
    pub final_level: u32,
    pub floor: u32,
}

/// Loop state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GamePhase {
    NotStarted,
    Running,
    /// Nothing advances, not even cooldowns
    Paused,
    /// Terminal
    Ended(Outcome),
}

pub struct GameSession {
    pub(crate) tuning: Tuning,
    seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) store: EntityStore,
    pub(crate) progression: ProgressionState,
    pub(crate) phase: GamePhase,
    pub(crate) spawn_gate: CooldownGate,
    pub(crate) resolver: CollisionResolver,
    player: EntityId,
    objective: Option<EntityId>,
    pub(crate) time_ticks: u64,
}

impl GameSession {
    /// Validate the tuning and lay out the opening field
    pub fn new(seed: u64, tuning: Tuning) -> Result<Self, ConfigError> {
        tuning.validate()?;

        let mut store = EntityStore::new();
        let objective = spawn::spawn_objective(&mut store, &tuning)?;
        let player = spawn::spawn_player(&mut store, &tuning)?;

        let progression = ProgressionState::new(&tuning);
        let spawn_gate = CooldownGate::new(progression.spawn_interval_ms)?;
        let resolver = CollisionResolver::standard().with_hit_grace(tuning.player.hit_grace_ms);

        log::debug!(
            "New session: seed {}, {:?} mode, {} difficulty, {} collision pairs",
            seed,
            tuning.mode,
            tuning.difficulty.as_str(),
            resolver.pairs().len()
        );

        Ok(Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            store,
            progression,
            phase: GamePhase::NotStarted,
            spawn_gate,
            resolver,
            player,
            objective,
            time_ticks: 0,
            tuning,
        })
    }

    pub fn start(&mut self) {
        if self.phase == GamePhase::NotStarted {
            log::info!("Run started (seed {})", self.seed);
            self.phase = GamePhase::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Running {
            log::info!("Paused");
            self.phase = GamePhase::Paused;
        }
    }

    /// Back to running; player and objective get a grace period so enemies
    /// that sat next to them during the pause cannot kill them instantly
    pub fn resume(&mut self) {
        if self.phase != GamePhase::Paused {
            return;
        }
        let grace = self.tuning.player.resume_grace_ms;
        for entity in self.store.iter_mut() {
            if let Some(invulnerability) = entity.kind.invulnerability_mut() {
                invulnerability.grant(grace);
            }
        }
        log::info!("Resumed with {}ms grace", grace);
        self.phase = GamePhase::Running;
    }

    pub(crate) fn end(&mut self, win: bool) -> Outcome {
        let outcome = Outcome {
            win,
            final_level: self.progression.level,
            floor: self.progression.floor,
        };
        log::info!(
            "Game over: {} at level {} (floor {})",
            if win { "victory" } else { "defeat" },
            outcome.final_level,
            outcome.floor
        );
        self.phase = GamePhase::Ended(outcome);
        outcome
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Ended(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            GamePhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn tick_count(&self) -> u64 {
        self.time_ticks
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn objective_id(&self) -> Option<EntityId> {
        self.objective
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.tuning.world.width, self.tuning.world.height)
    }

    /// Who enemies walk toward: the objective while it stands, else the player
    pub(crate) fn enemy_target(&self) -> EntityId {
        self.objective
            .filter(|id| self.store.position_of(*id).is_some())
            .unwrap_or(self.player)
    }

    pub(crate) fn player_data_mut(&mut self) -> Option<&mut PlayerData> {
        match self.store.get_mut(self.player).map(|e| &mut e.kind) {
            Some(EntityKind::Player(data)) => Some(data),
            _ => None,
        }
    }

    pub fn player_data(&self) -> Option<&PlayerData> {
        match self.store.get(self.player).map(|e| &e.kind) {
            Some(EntityKind::Player(data)) => Some(data),
            _ => None,
        }
    }

    /// Add a weapon; a second copy of the same kind stacks instead
    pub fn equip_weapon(&mut self, weapon: Weapon) -> Result<(), ConfigError> {
        let Some(player) = self.player_data_mut() else {
            return Ok(());
        };
        match player.weapons.iter_mut().find(|w| w.kind == weapon.kind) {
            Some(existing) => existing.stack()?,
            None => player.weapons.push(weapon),
        }
        Ok(())
    }

    /// Draw `n` distinct catalogue weapons to choose from
    pub fn offer_weapons(&mut self, boss_reward: bool, n: usize) -> Vec<WeaponId> {
        weapon::offer_weapons(&mut self.rng, boss_reward, n)
    }

    /// Take a weapon from an offer. A boss reward joins the arsenal (or
    /// stacks); a starting pick replaces it.
    pub fn select_weapon(&mut self, id: WeaponId, boss_reward: bool) -> Result<(), ConfigError> {
        let weapon = id.build()?;
        log::debug!("Weapon: {}", id.name());
        if boss_reward {
            return self.equip_weapon(weapon);
        }

        let player = self.player;
        let Some(data) = self.player_data_mut() else {
            return Ok(());
        };
        data.weapons = vec![weapon];
        // Blades of the old arsenal would otherwise keep circling
        self.store.remove_where(|e| {
            matches!(&e.kind, EntityKind::Projectile(p) if p.weapon_slot.is_some())
                && matches!(e.motion, Motion::Orbit { center, .. } if center == player)
        });
        Ok(())
    }

    /// Apply a chosen upgrade
    pub fn apply_upgrade(&mut self, upgrade: Upgrade) -> Result<(), ConfigError> {
        log::debug!("Upgrade: {}", upgrade.name());
        upgrade.apply(self)
    }

    /// Draw `n` distinct upgrades the current layout can use
    pub fn offer_upgrades(&mut self, legendary: bool, n: usize) -> Vec<Upgrade> {
        let has_objective = self.objective.is_some();
        let pool: Vec<Upgrade> = if legendary {
            Upgrade::legendary_pool()
        } else {
            Upgrade::normal_pool()
        }
        .iter()
        .copied()
        .filter(|u| has_objective || !u.needs_objective())
        .collect();
        super::upgrade::offer(&mut self.rng, &pool, n)
    }

    /// Read-only copy of the field for the renderer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::KindTag;
    use crate::sim::weapon::WeaponKind;
    use crate::sim::{InputState, tick};

    #[test]
    fn test_new_session_layout() {
        let session = GameSession::new(42, Tuning::obelisk()).unwrap();
        assert_eq!(session.phase(), GamePhase::NotStarted);
        assert_eq!(session.store().count(KindTag::Player), 1);
        assert_eq!(session.store().count(KindTag::Objective), 1);
        assert_eq!(session.enemy_target(), session.objective_id().unwrap());

        let dungeon = GameSession::new(42, Tuning::dungeon()).unwrap();
        assert!(dungeon.objective_id().is_none());
        assert_eq!(dungeon.enemy_target(), dungeon.player_id());
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let mut tuning = Tuning::obelisk();
        tuning.player.radius = 0.0;
        assert!(GameSession::new(1, tuning).is_err());
    }

    #[test]
    fn test_phase_transitions() {
        let mut session = GameSession::new(1, Tuning::obelisk()).unwrap();
        session.pause();
        assert_eq!(session.phase(), GamePhase::NotStarted);
        session.start();
        session.pause();
        assert_eq!(session.phase(), GamePhase::Paused);
        session.resume();
        assert_eq!(session.phase(), GamePhase::Running);
        let outcome = session.end(false);
        assert_eq!(session.outcome(), Some(outcome));
        session.start();
        session.resume();
        assert!(session.is_over());
    }

    #[test]
    fn test_resume_grants_grace() {
        let mut session = GameSession::new(1, Tuning::obelisk()).unwrap();
        session.start();
        session.pause();
        session.resume();
        for kind in [KindTag::Player, KindTag::Objective] {
            let entity = session.store().first_of(kind).unwrap();
            assert!(entity.kind.is_invulnerable());
        }
    }

    #[test]
    fn test_equip_same_weapon_stacks() {
        let mut session = GameSession::new(1, Tuning::obelisk()).unwrap();
        let weapon = Weapon::from_tuning(&session.tuning().weapon).unwrap();
        session.equip_weapon(weapon).unwrap();
        let melee = Weapon::new(WeaponKind::Melee { range: 48.0, arc: 1.0 }, 25.0, 500.0).unwrap();
        session.equip_weapon(melee).unwrap();

        let weapons = &session.player_data().unwrap().weapons;
        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[0].count, 2);
        assert_eq!(weapons[0].gate.threshold_ms(), 250.0);
    }

    #[test]
    fn test_offer_skips_objective_upgrades_without_objective() {
        let mut session = GameSession::new(9, Tuning::dungeon()).unwrap();
        for _ in 0..20 {
            let offer = session.offer_upgrades(false, 3);
            assert_eq!(offer.len(), 3);
            assert!(offer.iter().all(|u| !u.needs_objective()));
        }
    }

    #[test]
    fn test_starting_weapon_offers_rarely_hold_dragons() {
        let mut session = GameSession::new(3, Tuning::dungeon()).unwrap();
        let mut with_dragons = 0;
        for _ in 0..200 {
            let offer = session.offer_weapons(false, 3);
            assert_eq!(offer.len(), 3);
            let mut distinct = offer.clone();
            distinct.sort_by_key(|id| id.name());
            distinct.dedup();
            assert_eq!(distinct.len(), 3);
            if offer.iter().any(|id| id.is_dragon()) {
                with_dragons += 1;
            }
        }
        // 5% let dragons in, and then only some draws pick one
        assert!(with_dragons < 30, "{} offers held dragons", with_dragons);
    }

    #[test]
    fn test_boss_reward_offers_include_dragons() {
        let mut session = GameSession::new(3, Tuning::dungeon()).unwrap();
        let seen = (0..50)
            .flat_map(|_| session.offer_weapons(true, 3))
            .any(|id| id.is_dragon());
        assert!(seen);
    }

    #[test]
    fn test_select_weapon_boss_reward_adds() {
        let mut session = GameSession::new(1, Tuning::dungeon()).unwrap();
        session.select_weapon(WeaponId::Sword, true).unwrap();
        session.select_weapon(WeaponId::Sword, true).unwrap();

        let weapons = &session.player_data().unwrap().weapons;
        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[1].count, 2);
        assert_eq!(weapons[1].damage, 25.0);
    }

    #[test]
    fn test_select_weapon_starting_pick_replaces() {
        let mut tuning = Tuning::dungeon();
        tuning.weapon = WeaponId::Scythe.tuning();
        let mut session = GameSession::new(1, tuning).unwrap();
        session.start();
        tick(&mut session, &InputState::default(), 16.0);
        assert_eq!(session.store().count(KindTag::Projectile), 1);

        session.select_weapon(WeaponId::DragonBow, false).unwrap();
        let weapons = &session.player_data().unwrap().weapons;
        assert_eq!(weapons.len(), 1);
        assert_eq!(weapons[0].damage, 30.0);
        assert!(matches!(weapons[0].kind, WeaponKind::Ranged { .. }));
        assert_eq!(session.store().count(KindTag::Projectile), 0);
    }
}
