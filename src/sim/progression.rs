//! XP, levels and the difficulty ramp
//!
//! Progression reacts to events only. Multipliers are applied when an enemy
//! is spawned, so a boss kill makes the next wave harder without touching
//! anything already on the field.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::events::GameEvent;
use crate::tuning::{BossTuning, EnemyTuning, ProgressionTuning, Tuning, WaveMode};

/// Boss encounter state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encounter {
    #[default]
    Normal,
    /// Normal spawns stop; the boss enters once the field is clear
    BossPending,
    BossActive(EntityId),
}

impl Encounter {
    /// True while normal spawning is suppressed
    pub fn is_boss_fight(&self) -> bool {
        !matches!(self, Encounter::Normal)
    }
}

/// Spawn stats after multipliers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub radius: f32,
    pub health: f32,
    pub speed: f32,
    pub contact_damage: f32,
    pub xp: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionState {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub enemy_health_multiplier: f32,
    pub enemy_speed_multiplier: f32,
    pub contact_damage_multiplier: f32,
    /// Flat speed added per level before the multiplier
    pub enemy_speed_bonus: f32,
    /// Current stream spawn interval
    pub spawn_interval_ms: f32,
    /// Floors mode: current floor (0 before the first)
    pub floor: u32,
    pub encounter: Encounter,
    /// Stream mode: levels on the boss interval start a boss fight
    level_bosses: bool,
}

impl ProgressionState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: tuning.progression.xp_to_first_level,
            enemy_health_multiplier: 1.0,
            enemy_speed_multiplier: 1.0,
            contact_damage_multiplier: 1.0,
            enemy_speed_bonus: 0.0,
            spawn_interval_ms: tuning.progression.spawn_interval_ms,
            floor: 0,
            encounter: Encounter::Normal,
            level_bosses: tuning.mode == WaveMode::Stream,
        }
    }

    /// Apply one event; returns follow-up events to process after it
    pub fn on_event(&mut self, event: &GameEvent, tuning: &ProgressionTuning) -> Vec<GameEvent> {
        match event {
            GameEvent::XpGained { amount } => self.gain_xp(*amount, tuning),
            GameEvent::LeveledUp { level } => {
                self.on_level_up(*level, tuning);
                Vec::new()
            }
            GameEvent::BossSpawned { id, .. } => {
                self.encounter = Encounter::BossActive(*id);
                Vec::new()
            }
            GameEvent::Died { boss: true, .. } => vec![GameEvent::BossDefeated { level: self.level }],
            GameEvent::BossDefeated { level } => {
                self.on_boss_defeated(tuning);
                log::info!(
                    "Boss defeated at level {}; enemy health x{}",
                    level,
                    self.enemy_health_multiplier
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn gain_xp(&mut self, amount: u32, tuning: &ProgressionTuning) -> Vec<GameEvent> {
        self.xp = self.xp.saturating_add(amount);
        // At most one level per pickup; any surplus carries to the next event
        if self.xp < self.xp_to_next_level {
            return Vec::new();
        }
        self.xp -= self.xp_to_next_level;
        self.xp_to_next_level = ((self.xp_to_next_level as f32 * tuning.xp_growth).floor() as u32).max(1);
        self.level += 1;
        log::info!("Level {} reached, next at {} XP", self.level, self.xp_to_next_level);
        vec![GameEvent::LeveledUp { level: self.level }]
    }

    fn on_level_up(&mut self, level: u32, tuning: &ProgressionTuning) {
        self.spawn_interval_ms = (self.spawn_interval_ms - tuning.spawn_interval_step_ms)
            .max(tuning.min_spawn_interval_ms);
        self.enemy_speed_bonus += tuning.per_level_speed_bonus;

        if self.level_bosses
            && tuning.boss_interval > 0
            && level % tuning.boss_interval == 0
            && self.encounter == Encounter::Normal
        {
            log::info!("Level {}: boss incoming", level);
            self.encounter = Encounter::BossPending;
        }
    }

    fn on_boss_defeated(&mut self, tuning: &ProgressionTuning) {
        // Factor is validated >= 1 so multipliers never shrink
        let factor = tuning.boss_difficulty_factor.max(1.0);
        self.enemy_health_multiplier *= factor;
        self.enemy_speed_multiplier *= factor;
        self.contact_damage_multiplier *= factor;
        self.encounter = Encounter::Normal;
    }

    /// Floors mode: the floor a boss guards
    pub fn is_boss_floor(&self, tuning: &ProgressionTuning) -> bool {
        tuning.boss_interval > 0 && self.floor > 0 && self.floor % tuning.boss_interval == 0
    }

    /// Regular enemy stats for the next spawn
    pub fn enemy_stats(&self, base: &EnemyTuning) -> EnemyStats {
        EnemyStats {
            radius: base.radius,
            health: base.health * self.enemy_health_multiplier,
            speed: (base.speed + self.enemy_speed_bonus) * self.enemy_speed_multiplier,
            contact_damage: (base.contact_damage * self.contact_damage_multiplier).round(),
            xp: base.xp_per_kill,
        }
    }

    /// Boss stats, relative to the current regular enemy
    pub fn boss_stats(&self, base: &EnemyTuning, boss: &BossTuning) -> EnemyStats {
        let regular = self.enemy_stats(base);
        EnemyStats {
            radius: boss.radius,
            health: regular.health * boss.health_factor,
            speed: regular.speed * boss.speed_factor,
            contact_damage: regular.contact_damage,
            xp: boss.xp,
        }
    }

    /// Fraction of the current level's XP bar filled
    pub fn xp_fraction(&self) -> f32 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        (self.xp as f32 / self.xp_to_next_level as f32).clamp(0.0, 1.0)
    }
}
