//! Level-up upgrades
//!
//! Choosing is UI glue; the core only draws offers and applies the pick.

use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, KindTag, Motion};
use super::state::GameSession;
use super::weapon::WeaponKind;
use crate::error::ConfigError;

/// Battle Focus invulnerability
const FOCUS_MS: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upgrade {
    FasterFire,
    MoveSpeed,
    BulletSpeed,
    MaxHealth,
    Heal,
    ExtraProjectile,
    StrongerShots,
    StrongerMagnet,
    ObjectiveHeal,
    ObjectiveShield,
    BiggerShots,
    BattleFocus,
    // Legendary
    HeatSeeking,
    UltraMagnet,
    MegaHealth,
    DoubleDamage,
    RapidFire,
}

const NORMAL: [Upgrade; 12] = [
    Upgrade::FasterFire,
    Upgrade::MoveSpeed,
    Upgrade::BulletSpeed,
    Upgrade::MaxHealth,
    Upgrade::Heal,
    Upgrade::ExtraProjectile,
    Upgrade::StrongerShots,
    Upgrade::StrongerMagnet,
    Upgrade::ObjectiveHeal,
    Upgrade::ObjectiveShield,
    Upgrade::BiggerShots,
    Upgrade::BattleFocus,
];

const LEGENDARY: [Upgrade; 5] = [
    Upgrade::HeatSeeking,
    Upgrade::UltraMagnet,
    Upgrade::MegaHealth,
    Upgrade::DoubleDamage,
    Upgrade::RapidFire,
];

impl Upgrade {
    /// Offered on every level-up
    pub fn normal_pool() -> &'static [Upgrade] {
        &NORMAL
    }

    /// Offered after a boss kill
    pub fn legendary_pool() -> &'static [Upgrade] {
        &LEGENDARY
    }

    pub fn name(&self) -> &'static str {
        match self {
            Upgrade::FasterFire => "Faster Fire Rate",
            Upgrade::MoveSpeed => "Move Speed +20%",
            Upgrade::BulletSpeed => "Bullet Speed +50%",
            Upgrade::MaxHealth => "Max Health +5",
            Upgrade::Heal => "Heal +5",
            Upgrade::ExtraProjectile => "Multi-Projectiles",
            Upgrade::StrongerShots => "Stronger Bullets",
            Upgrade::StrongerMagnet => "Stronger XP Magnet",
            Upgrade::ObjectiveHeal => "Obelisk Healing",
            Upgrade::ObjectiveShield => "Obelisk Shield",
            Upgrade::BiggerShots => "Bigger Bullets",
            Upgrade::BattleFocus => "Battle Focus",
            Upgrade::HeatSeeking => "Heat Seeking Bullets",
            Upgrade::UltraMagnet => "Ultra Magnet",
            Upgrade::MegaHealth => "Mega Health Boost",
            Upgrade::DoubleDamage => "Double Damage",
            Upgrade::RapidFire => "Rapid Fire",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Upgrade::FasterFire => "Attack 15% more often",
            Upgrade::MoveSpeed => "Move 20% faster",
            Upgrade::BulletSpeed => "Projectiles fly 50% faster",
            Upgrade::MaxHealth => "+5 max health, healed by the same amount",
            Upgrade::Heal => "Restore 5 health",
            Upgrade::ExtraProjectile => "One more projectile on each side of every shot",
            Upgrade::StrongerShots => "+1 damage on every weapon",
            Upgrade::StrongerMagnet => "XP pickup range +40%",
            Upgrade::ObjectiveHeal => "Restore 5 health to the obelisk",
            Upgrade::ObjectiveShield => "Add 5 shield to the obelisk",
            Upgrade::BiggerShots => "Projectiles 75% larger",
            Upgrade::BattleFocus => "Invulnerable for 10 seconds",
            Upgrade::HeatSeeking => "Projectiles curve toward enemies ahead",
            Upgrade::UltraMagnet => "XP pickup range x20",
            Upgrade::MegaHealth => "+20 max health, healed by the same amount",
            Upgrade::DoubleDamage => "Double the damage of every weapon",
            Upgrade::RapidFire => "Attack twice as often",
        }
    }

    /// Only useful when the layout has an objective
    pub fn needs_objective(&self) -> bool {
        matches!(self, Upgrade::ObjectiveHeal | Upgrade::ObjectiveShield)
    }

    pub fn apply(&self, session: &mut GameSession) -> Result<(), ConfigError> {
        match self {
            Upgrade::ObjectiveHeal | Upgrade::ObjectiveShield => {
                return apply_objective(*self, session);
            }
            Upgrade::BiggerShots => resize_live_shots(session, 1.75),
            Upgrade::StrongerMagnet => rescale_magnet(session, 1.4),
            Upgrade::UltraMagnet => rescale_magnet(session, 20.0),
            _ => {}
        }

        let Some(player) = session.player_data_mut() else {
            return Ok(());
        };
        match self {
            Upgrade::FasterFire => {
                for weapon in &mut player.weapons {
                    weapon.scale_cooldown(0.85)?;
                }
            }
            Upgrade::RapidFire => {
                for weapon in &mut player.weapons {
                    weapon.scale_cooldown(0.5)?;
                }
            }
            Upgrade::MoveSpeed => player.speed *= 1.2,
            Upgrade::MaxHealth => player.vitals.grow(5.0),
            Upgrade::MegaHealth => player.vitals.grow(20.0),
            Upgrade::Heal => player.vitals.heal(5.0),
            Upgrade::StrongerShots => {
                for weapon in &mut player.weapons {
                    weapon.damage += 1.0;
                }
            }
            Upgrade::DoubleDamage => {
                for weapon in &mut player.weapons {
                    weapon.damage *= 2.0;
                }
            }
            Upgrade::BattleFocus => player.invulnerability.grant(FOCUS_MS),
            Upgrade::StrongerMagnet => player.magnet_range *= 1.4,
            Upgrade::UltraMagnet => player.magnet_range *= 20.0,
            Upgrade::BulletSpeed
            | Upgrade::ExtraProjectile
            | Upgrade::BiggerShots
            | Upgrade::HeatSeeking => {
                for weapon in &mut player.weapons {
                    if let WeaponKind::Ranged {
                        projectile_speed,
                        projectile_radius,
                        multishot,
                        homing,
                        ..
                    } = &mut weapon.kind
                    {
                        match self {
                            Upgrade::BulletSpeed => *projectile_speed *= 1.5,
                            Upgrade::ExtraProjectile => *multishot += 1,
                            Upgrade::BiggerShots => *projectile_radius *= 1.75,
                            _ => *homing = true,
                        }
                    }
                }
            }
            Upgrade::ObjectiveHeal | Upgrade::ObjectiveShield => {}
        }
        Ok(())
    }
}

fn apply_objective(upgrade: Upgrade, session: &mut GameSession) -> Result<(), ConfigError> {
    let Some(id) = session.objective_id() else {
        return Ok(());
    };
    let Some(vitals) = session.store.get_mut(id).and_then(|e| e.kind.vitals_mut()) else {
        return Ok(());
    };
    if upgrade == Upgrade::ObjectiveShield {
        vitals.shield += 5.0;
    } else {
        vitals.heal(5.0);
    }
    Ok(())
}

/// Shots already in flight grow with the upgrade
fn resize_live_shots(session: &mut GameSession, factor: f32) {
    for shot in session.store.iter_mut() {
        if let EntityKind::Projectile(data) = &shot.kind
            && data.weapon_slot.is_none()
        {
            shot.radius *= factor;
        }
    }
}

/// Orbs already dropped pick up the new magnet range
fn rescale_magnet(session: &mut GameSession, factor: f32) {
    for orb in session.store.iter_mut() {
        if orb.tag() != KindTag::Pickup {
            continue;
        }
        if let Motion::Attract { range, .. } = &mut orb.motion {
            *range *= factor;
        }
    }
}

/// Draw up to `n` distinct upgrades from `pool`
pub fn offer(rng: &mut Pcg32, pool: &[Upgrade], n: usize) -> Vec<Upgrade> {
    pool.choose_multiple(rng, n).copied().collect()
}
