//! Game balance and difficulty presets
//!
//! Every number the simulation needs lives here so a shell can ship balance
//! changes as JSON. Speeds are in world units per reference frame, times in
//! milliseconds.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, non_negative, positive, within};
use crate::sim::entity::EdgePolicy;
use crate::sim::weapon::{AimMode, WeaponId, WeaponKind};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Scale applied to the time between stream spawns
    pub fn spawn_interval_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.25,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 0.75,
        }
    }

    /// Scale applied to base enemy speed
    pub fn enemy_speed_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 0.8,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 1.2,
        }
    }

    /// Scale applied to player max health
    pub fn player_health_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.5,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 1.0,
        }
    }

    /// Apply this preset on top of an existing tuning
    pub fn apply(&self, tuning: &mut Tuning) {
        tuning.difficulty = *self;
        tuning.progression.spawn_interval_ms *= self.spawn_interval_scale();
        tuning.enemies.speed *= self.enemy_speed_scale();
        tuning.player.max_health = (tuning.player.max_health * self.player_health_scale()).round();
    }
}

/// How enemies enter the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// Timer-driven trickle from the edges (objective defence)
    #[default]
    Stream,
    /// Discrete floors; the next floor starts when the field is clear
    Floors,
}

/// Frame timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameTuning {
    /// Frame duration speed constants are expressed against
    pub reference_frame_ms: f32,
    /// Clamp for a single tick's delta
    pub max_delta_ms: f32,
}

impl Default for FrameTuning {
    fn default() -> Self {
        Self {
            reference_frame_ms: REFERENCE_FRAME_MS,
            max_delta_ms: MAX_DELTA_MS,
        }
    }
}

/// World rectangle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub width: f32,
    pub height: f32,
    pub spawn_margin: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            spawn_margin: SPAWN_MARGIN,
        }
    }
}

/// Player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    pub max_health: f32,
    /// Units per reference frame
    pub speed: f32,
    pub edge: EdgePolicy,
    /// Invulnerability granted after taking contact damage (0 disables)
    pub hit_grace_ms: f32,
    /// Invulnerability granted to player and objective on resume
    pub resume_grace_ms: f32,
    /// XP orbs within this distance drift toward the player
    pub magnet_range: f32,
    /// Fraction of the gap an orb closes per reference frame
    pub magnet_pull: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 15.0,
            max_health: 5.0,
            speed: 2.0,
            edge: EdgePolicy::Clamp,
            hit_grace_ms: 0.0,
            resume_grace_ms: 1000.0,
            magnet_range: 100.0,
            magnet_pull: 0.05,
        }
    }
}

/// Defended objective (obelisk)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveTuning {
    pub radius: f32,
    pub max_health: f32,
    pub shield: f32,
}

impl Default for ObjectiveTuning {
    fn default() -> Self {
        Self {
            radius: 30.0,
            max_health: 10.0,
            shield: 0.0,
        }
    }
}

/// Regular enemy template (before progression multipliers)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub radius: f32,
    pub health: f32,
    pub speed: f32,
    pub contact_damage: f32,
    pub xp_per_kill: u32,
    /// Floors mode: enemies on floor N = base + N / 2
    pub base_floor_enemies: u32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            radius: 12.0,
            health: 1.0,
            speed: 0.5,
            contact_damage: 1.0,
            xp_per_kill: 3,
            base_floor_enemies: 3,
        }
    }
}

/// Boss template, relative to the regular enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub radius: f32,
    pub health_factor: f32,
    pub speed_factor: f32,
    pub xp: u32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            radius: 30.0,
            health_factor: 10.0,
            speed_factor: 0.5,
            xp: 3,
        }
    }
}

/// Level curve and difficulty ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub xp_to_first_level: u32,
    pub xp_growth: f32,
    pub boss_interval: u32,
    pub boss_difficulty_factor: f32,
    pub spawn_interval_ms: f32,
    pub spawn_interval_step_ms: f32,
    pub min_spawn_interval_ms: f32,
    pub per_level_speed_bonus: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            xp_to_first_level: 10,
            xp_growth: XP_GROWTH,
            boss_interval: BOSS_INTERVAL,
            boss_difficulty_factor: BOSS_DIFFICULTY_FACTOR,
            spawn_interval_ms: 900.0,
            spawn_interval_step_ms: 100.0,
            min_spawn_interval_ms: 300.0,
            per_level_speed_bonus: 0.08,
        }
    }
}

/// Starting weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub kind: WeaponKind,
    pub damage: f32,
    pub cooldown_ms: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            kind: WeaponKind::Ranged {
                projectile_speed: 4.0,
                projectile_radius: 4.0,
                piercing: false,
                multishot: 0,
                spread: 0.15,
                homing: false,
                range: 1000.0,
            },
            damage: 1.0,
            cooldown_ms: 500.0,
        }
    }
}

/// Complete balance sheet for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: DifficultyPreset,
    pub mode: WaveMode,
    pub aim: AimMode,
    pub frame: FrameTuning,
    pub world: WorldTuning,
    pub player: PlayerTuning,
    /// `None` removes the objective; enemies then hunt the player
    pub objective: Option<ObjectiveTuning>,
    pub enemies: EnemyTuning,
    pub boss: BossTuning,
    pub progression: ProgressionTuning,
    pub weapon: WeaponTuning,
    /// Reaching this level wins the run
    pub win_level: Option<u32>,
    /// Floors mode: reaching this floor wins the run
    pub win_floor: Option<u32>,
    /// Particles spawned per death (0 disables death bursts)
    pub death_particles: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::obelisk()
    }
}

impl Tuning {
    /// Objective defence: stream spawns, pointer aim, win at level 20
    pub fn obelisk() -> Self {
        Self {
            difficulty: DifficultyPreset::Normal,
            mode: WaveMode::Stream,
            aim: AimMode::Pointer,
            frame: FrameTuning::default(),
            world: WorldTuning::default(),
            player: PlayerTuning::default(),
            objective: Some(ObjectiveTuning::default()),
            enemies: EnemyTuning::default(),
            boss: BossTuning::default(),
            progression: ProgressionTuning::default(),
            weapon: WeaponTuning::default(),
            win_level: Some(20),
            win_floor: None,
            death_particles: 8,
        }
    }

    /// Dungeon floors: no objective, wrapping arena, auto-aim, win at floor 100
    pub fn dungeon() -> Self {
        Self {
            mode: WaveMode::Floors,
            aim: AimMode::NearestEnemy,
            player: PlayerTuning {
                radius: 16.0,
                max_health: 100.0,
                speed: 3.0,
                edge: EdgePolicy::Wrap,
                hit_grace_ms: 1000.0,
                ..PlayerTuning::default()
            },
            objective: None,
            enemies: EnemyTuning {
                radius: 16.0,
                health: 30.0,
                speed: 2.0,
                contact_damage: 5.0,
                xp_per_kill: 3,
                base_floor_enemies: 3,
            },
            boss: BossTuning {
                radius: 48.0,
                health_factor: 40.0,
                speed_factor: 0.5,
                xp: 30,
            },
            // Twenty boss floors; doubling each time would be unwinnable
            progression: ProgressionTuning {
                boss_difficulty_factor: 1.25,
                ..ProgressionTuning::default()
            },
            weapon: WeaponId::PiercingBow.tuning(),
            win_level: None,
            win_floor: Some(100),
            ..Self::obelisk()
        }
    }

    /// Build a tuning from a named layout and difficulty
    pub fn with_preset(mut self, preset: DifficultyPreset) -> Self {
        preset.apply(&mut self);
        self
    }

    /// Parse and validate a JSON tuning document (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would make the simulation meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("reference frame", self.frame.reference_frame_ms)?;
        positive("max delta", self.frame.max_delta_ms)?;

        positive("world width", self.world.width)?;
        positive("world height", self.world.height)?;
        non_negative("spawn margin", self.world.spawn_margin)?;

        positive("player radius", self.player.radius)?;
        positive("player max health", self.player.max_health)?;
        non_negative("player speed", self.player.speed)?;
        non_negative("hit grace", self.player.hit_grace_ms)?;
        non_negative("resume grace", self.player.resume_grace_ms)?;
        non_negative("magnet range", self.player.magnet_range)?;
        within("magnet pull", self.player.magnet_pull, 0.0, 1.0)?;

        if let Some(objective) = &self.objective {
            positive("objective radius", objective.radius)?;
            positive("objective max health", objective.max_health)?;
            non_negative("objective shield", objective.shield)?;
        }

        positive("enemy radius", self.enemies.radius)?;
        positive("enemy health", self.enemies.health)?;
        non_negative("enemy speed", self.enemies.speed)?;
        non_negative("enemy contact damage", self.enemies.contact_damage)?;

        positive("boss radius", self.boss.radius)?;
        positive("boss health factor", self.boss.health_factor)?;
        non_negative("boss speed factor", self.boss.speed_factor)?;

        let p = &self.progression;
        if p.xp_to_first_level == 0 {
            return Err(ConfigError::NonPositive {
                what: "xp to first level",
                value: 0.0,
            });
        }
        if p.boss_interval == 0 {
            return Err(ConfigError::NonPositive {
                what: "boss interval",
                value: 0.0,
            });
        }
        within("xp growth", p.xp_growth, 1.0, 10.0)?;
        // Multipliers only ever ramp up
        within("boss difficulty factor", p.boss_difficulty_factor, 1.0, 100.0)?;
        non_negative("spawn interval", p.spawn_interval_ms)?;
        non_negative("spawn interval step", p.spawn_interval_step_ms)?;
        non_negative("min spawn interval", p.min_spawn_interval_ms)?;
        non_negative("per-level speed bonus", p.per_level_speed_bonus)?;

        self.weapon.kind.validate()?;
        non_negative("weapon damage", self.weapon.damage)?;
        non_negative("weapon cooldown", self.weapon.cooldown_ms)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
        assert!(Tuning::dungeon().validate().is_ok());
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(DifficultyPreset::parse("HARD"), Some(DifficultyPreset::Hard));
        assert_eq!(DifficultyPreset::parse("norm"), Some(DifficultyPreset::Normal));
        assert_eq!(DifficultyPreset::parse("nightmare"), None);
        assert_eq!(DifficultyPreset::Easy.as_str(), "Easy");
    }

    #[test]
    fn test_hard_preset_tightens_spawns() {
        let normal = Tuning::obelisk();
        let hard = Tuning::obelisk().with_preset(DifficultyPreset::Hard);
        assert!(hard.progression.spawn_interval_ms < normal.progression.spawn_interval_ms);
        assert!(hard.enemies.speed > normal.enemies.speed);
        assert_eq!(hard.difficulty, DifficultyPreset::Hard);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let tuning = Tuning::from_json(r#"{ "enemies": { "health": 3.0 } }"#).unwrap();
        assert_eq!(tuning.enemies.health, 3.0);
        assert_eq!(tuning.enemies.radius, 12.0);
        assert_eq!(tuning.progression.xp_to_first_level, 10);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = Tuning::from_json(r#"{ "enemies": { "radius": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive { what: "enemy radius", .. }));

        let err = Tuning::from_json(r#"{ "weapon": { "cooldown_ms": -5.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { .. }));

        let err = Tuning::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_shrinking_boss_factor_rejected() {
        let mut tuning = Tuning::default();
        tuning.progression.boss_difficulty_factor = 0.5;
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
    }
}
