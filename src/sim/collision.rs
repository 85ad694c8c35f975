//! Circle collision detection and hit resolution
//!
//! Every entity is a circle. The resolver walks a configured list of
//! attacker/defender kind pairs in order; for each attacker it scans
//! defenders in store order and applies the pair's rule to every overlap
//! until the rule says stop. Removal is by flag, so an entity killed or
//! consumed early in the pass cannot take part in later collisions.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, EntityKind, KindTag};
use super::events::GameEvent;
use super::store::EntityStore;

/// What happens when an attacker overlaps a defender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitRule {
    /// Projectile damage with hit-set tracking; non-piercing stops at the first hit
    Strike,
    /// Kamikaze contact damage; the attacker is always consumed
    Contact,
    /// Pickup collected by the defender
    Collect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionPair {
    pub attacker: KindTag,
    pub defender: KindTag,
    pub rule: HitRule,
}

impl CollisionPair {
    pub const fn new(attacker: KindTag, defender: KindTag, rule: HitRule) -> Self {
        Self {
            attacker,
            defender,
            rule,
        }
    }
}

/// Strict overlap test: circles that merely touch do not collide
#[inline]
pub fn circles_overlap(a: &Entity, b: &Entity) -> bool {
    a.pos.distance(b.pos) < a.radius + b.radius
}

#[derive(Debug, Clone)]
pub struct CollisionResolver {
    pairs: Vec<CollisionPair>,
    /// Invulnerability granted to a player after contact damage
    hit_grace_ms: f32,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl CollisionResolver {
    pub fn new(pairs: Vec<CollisionPair>) -> Self {
        Self {
            pairs,
            hit_grace_ms: 0.0,
        }
    }

    /// Projectiles hit enemies, enemies ram the player and the objective,
    /// the player collects pickups
    pub fn standard() -> Self {
        Self::new(vec![
            CollisionPair::new(KindTag::Projectile, KindTag::Enemy, HitRule::Strike),
            CollisionPair::new(KindTag::Enemy, KindTag::Player, HitRule::Contact),
            CollisionPair::new(KindTag::Enemy, KindTag::Objective, HitRule::Contact),
            CollisionPair::new(KindTag::Pickup, KindTag::Player, HitRule::Collect),
        ])
    }

    pub fn with_hit_grace(mut self, ms: f32) -> Self {
        self.hit_grace_ms = ms.max(0.0);
        self
    }

    pub fn pairs(&self) -> &[CollisionPair] {
        &self.pairs
    }

    /// Run one resolution pass over the store
    pub fn resolve(&self, store: &mut EntityStore) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let entities = store.as_mut_slice();
        let n = entities.len();

        for pair in &self.pairs {
            for i in 0..n {
                if entities[i].tag() != pair.attacker || !entities[i].is_alive() {
                    continue;
                }
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if !entities[i].is_alive() {
                        break;
                    }
                    let defender = &entities[j];
                    if defender.tag() != pair.defender || !defender.is_alive() {
                        continue;
                    }
                    if !circles_overlap(&entities[i], defender) {
                        continue;
                    }

                    let stop = match pair.rule {
                        HitRule::Strike => strike(entities, i, j, &mut events),
                        HitRule::Contact => self.contact(entities, i, j, &mut events),
                        HitRule::Collect => collect(entities, i, &mut events),
                    };
                    if stop {
                        break;
                    }
                }
            }
        }

        events
    }

    fn contact(&self, entities: &mut [Entity], i: usize, j: usize, events: &mut Vec<GameEvent>) -> bool {
        let damage = match &entities[i].kind {
            EntityKind::Enemy(enemy) => enemy.contact_damage,
            _ => 0.0,
        };
        entities[i].despawn = true;

        let defender = &mut entities[j];
        if defender.kind.is_invulnerable() {
            log::trace!("Contact on invulnerable {}, no damage", defender.id);
            return true;
        }
        damage_entity(defender, damage, events);

        if let EntityKind::Player(player) = &mut defender.kind
            && self.hit_grace_ms > 0.0
        {
            player.invulnerability.grant(self.hit_grace_ms);
        }
        true
    }
}

/// Projectile hits enemy; returns true when the projectile is spent
fn strike(entities: &mut [Entity], i: usize, j: usize, events: &mut Vec<GameEvent>) -> bool {
    let target = entities[j].id;
    let piercing = entities[i].tags.piercing;
    let damage = {
        let EntityKind::Projectile(projectile) = &mut entities[i].kind else {
            return false;
        };
        if !projectile.hits.insert(target) {
            // Already damaged this target on an earlier tick
            return false;
        }
        projectile.damage
    };

    damage_entity(&mut entities[j], damage, events);

    if !piercing {
        entities[i].despawn = true;
        return true;
    }
    false
}

fn collect(entities: &mut [Entity], i: usize, events: &mut Vec<GameEvent>) -> bool {
    let pickup = &mut entities[i];
    if let EntityKind::Pickup(data) = &pickup.kind {
        events.push(GameEvent::XpGained { amount: data.xp });
    }
    pickup.despawn = true;
    true
}

/// Apply damage through shield and health, flagging the entity if it dies
fn damage_entity(entity: &mut Entity, amount: f32, events: &mut Vec<GameEvent>) {
    if entity.kind.is_invulnerable() {
        return;
    }
    let (id, kind, pos, boss) = (entity.id, entity.tag(), entity.pos, entity.is_boss());
    let Some(vitals) = entity.kind.vitals_mut() else {
        return;
    };

    let outcome = vitals.apply_damage(amount);
    events.push(GameEvent::DamageDealt {
        target: id,
        kind,
        amount: outcome.dealt,
        absorbed: outcome.absorbed,
    });
    if outcome.shield_broken {
        events.push(GameEvent::ShieldBroken { target: id });
    }
    if vitals.is_dead() {
        entity.despawn = true;
        events.push(GameEvent::Died {
            id,
            kind,
            pos,
            boss,
        });
    }
}

/// Damage a specific entity outside of a projectile collision (melee swings)
pub fn apply_strike(store: &mut EntityStore, target: EntityId, damage: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if let Some(entity) = store.get_mut(target)
        && entity.is_alive()
    {
        damage_entity(entity, damage, &mut events);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{
        EnemyData, Invulnerability, ObjectiveData, PickupData, PlayerData, ProjectileData, Tags,
        Vitals,
    };
    use glam::Vec2;

    fn projectile(x: f32, radius: f32, damage: f32, piercing: bool) -> Entity {
        let tags = if piercing { Tags::piercing() } else { Tags::default() };
        Entity::new(
            EntityKind::Projectile(ProjectileData::new(damage).unwrap()),
            Vec2::new(x, 0.0),
            radius,
        )
        .unwrap()
        .with_tags(tags)
    }

    fn enemy(x: f32, radius: f32, health: f32, contact: f32) -> Entity {
        Entity::new(
            EntityKind::Enemy(EnemyData::new(health, contact, 3).unwrap()),
            Vec2::new(x, 0.0),
            radius,
        )
        .unwrap()
    }

    fn objective(shield: f32) -> Entity {
        Entity::new(
            EntityKind::Objective(ObjectiveData {
                vitals: Vitals::new(10.0).unwrap().with_shield(shield).unwrap(),
                invulnerability: Invulnerability::default(),
            }),
            Vec2::ZERO,
            30.0,
        )
        .unwrap()
    }

    fn player() -> Entity {
        Entity::new(
            EntityKind::Player(PlayerData {
                vitals: Vitals::new(5.0).unwrap(),
                invulnerability: Invulnerability::default(),
                speed: 2.0,
                weapons: Vec::new(),
                magnet_range: 100.0,
            }),
            Vec2::ZERO,
            15.0,
        )
        .unwrap()
    }

    fn health(store: &EntityStore, id: EntityId) -> f32 {
        store.get(id).unwrap().kind.vitals().unwrap().health
    }

    #[test]
    fn test_overlap_is_strict_and_symmetric() {
        let a = projectile(0.0, 5.0, 1.0, false);
        let b = enemy(9.0, 5.0, 1.0, 0.0);
        assert!(circles_overlap(&a, &b) && circles_overlap(&b, &a));
        let c = enemy(11.0, 5.0, 1.0, 0.0);
        assert!(!circles_overlap(&a, &c) && !circles_overlap(&c, &a));
        let touching = enemy(10.0, 5.0, 1.0, 0.0);
        assert!(!circles_overlap(&a, &touching));
    }

    #[test]
    fn test_resolve_reports_hit_at_nine_not_eleven() {
        let resolver = CollisionResolver::standard();

        let mut store = EntityStore::new();
        store.add(projectile(0.0, 5.0, 1.0, false));
        store.add(enemy(9.0, 5.0, 5.0, 0.0));
        let events = resolver.resolve(&mut store);
        assert!(matches!(events[0], GameEvent::DamageDealt { .. }));

        let mut store = EntityStore::new();
        store.add(projectile(0.0, 5.0, 1.0, false));
        store.add(enemy(11.0, 5.0, 5.0, 0.0));
        assert!(resolver.resolve(&mut store).is_empty());
    }

    #[test]
    fn test_non_piercing_stops_at_first_in_store_order() {
        let mut store = EntityStore::new();
        let shot = store.add(projectile(0.0, 10.0, 1.0, false));
        let first = store.add(enemy(2.0, 5.0, 5.0, 0.0));
        let second = store.add(enemy(-2.0, 5.0, 5.0, 0.0));
        CollisionResolver::standard().resolve(&mut store);
        assert_eq!(health(&store, first), 4.0);
        assert_eq!(health(&store, second), 5.0);
        assert!(store.get(shot).unwrap().despawn);
    }

    #[test]
    fn test_piercing_hits_each_target_once() {
        let resolver = CollisionResolver::standard();
        let mut store = EntityStore::new();
        let shot = store.add(projectile(-4.0, 5.0, 1.0, true));
        let a = store.add(enemy(0.0, 5.0, 5.0, 0.0));
        let b = store.add(enemy(1.0, 5.0, 5.0, 0.0));

        resolver.resolve(&mut store);
        // Next tick: projectile has moved but still overlaps both
        store.get_mut(shot).unwrap().pos.x = 0.5;
        resolver.resolve(&mut store);

        assert_eq!(health(&store, a), 4.0);
        assert_eq!(health(&store, b), 4.0);
        assert!(!store.get(shot).unwrap().despawn);
    }

    #[test]
    fn test_dead_enemy_not_hit_again_in_same_pass() {
        let mut store = EntityStore::new();
        store.add(projectile(0.0, 5.0, 1.0, false));
        let second = store.add(projectile(0.0, 5.0, 1.0, false));
        store.add(enemy(1.0, 5.0, 1.0, 0.0));
        let events = CollisionResolver::standard().resolve(&mut store);

        let deaths = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Died { kind: KindTag::Enemy, .. }))
            .count();
        assert_eq!(deaths, 1);
        assert!(!store.get(second).unwrap().despawn);
    }

    #[test]
    fn test_shield_absorbs_contact() {
        let mut store = EntityStore::new();
        let obelisk = store.add(objective(5.0));
        store.add(enemy(20.0, 12.0, 1.0, 3.0));
        CollisionResolver::standard().resolve(&mut store);

        let vitals = store.get(obelisk).unwrap().kind.vitals().unwrap().clone();
        assert_eq!(vitals.shield, 2.0);
        assert_eq!(vitals.health, 10.0);
    }

    #[test]
    fn test_shield_breaks_and_excess_passes() {
        let mut store = EntityStore::new();
        let obelisk = store.add(objective(5.0));
        store.add(enemy(20.0, 12.0, 1.0, 8.0));
        let events = CollisionResolver::standard().resolve(&mut store);

        assert!(events.contains(&GameEvent::ShieldBroken { target: obelisk }));
        let vitals = store.get(obelisk).unwrap().kind.vitals().unwrap();
        assert_eq!(vitals.shield, 0.0);
        assert_eq!(vitals.health, 7.0);
    }

    #[test]
    fn test_contact_consumes_enemy_even_when_invulnerable() {
        let mut store = EntityStore::new();
        let mut p = player();
        if let EntityKind::Player(data) = &mut p.kind {
            data.invulnerability.permanent = true;
        }
        let pid = store.add(p);
        let eid = store.add(enemy(10.0, 12.0, 1.0, 2.0));
        let events = CollisionResolver::standard().resolve(&mut store);

        assert!(events.is_empty());
        assert_eq!(health(&store, pid), 5.0);
        assert!(store.get(eid).unwrap().despawn);
    }

    #[test]
    fn test_contact_grants_hit_grace() {
        let mut store = EntityStore::new();
        let pid = store.add(player());
        store.add(enemy(10.0, 12.0, 1.0, 2.0));
        store.add(enemy(-10.0, 12.0, 1.0, 2.0));
        CollisionResolver::standard()
            .with_hit_grace(1000.0)
            .resolve(&mut store);

        // Second enemy is consumed but deals nothing during the grace window
        assert_eq!(health(&store, pid), 3.0);
        assert!(store.get(pid).unwrap().kind.is_invulnerable());
        assert_eq!(store.count(KindTag::Enemy), 0);
    }

    #[test]
    fn test_pickup_collected() {
        let mut store = EntityStore::new();
        store.add(player());
        let orb = Entity::new(EntityKind::Pickup(PickupData { xp: 3 }), Vec2::new(5.0, 0.0), 4.0)
            .unwrap();
        store.add(orb);
        let events = CollisionResolver::standard().resolve(&mut store);
        assert_eq!(events, vec![GameEvent::XpGained { amount: 3 }]);
        assert_eq!(store.count(KindTag::Pickup), 0);
    }

    #[test]
    fn test_only_configured_pairs_resolve() {
        let standard = CollisionResolver::standard();
        assert_eq!(standard.pairs().len(), 4);
        assert_eq!(standard.pairs()[0].rule, HitRule::Strike);

        let collect_only = CollisionResolver::new(vec![CollisionPair::new(
            KindTag::Pickup,
            KindTag::Player,
            HitRule::Collect,
        )]);
        let mut store = EntityStore::new();
        store.add(projectile(0.0, 5.0, 1.0, false));
        let target = store.add(enemy(4.0, 5.0, 1.0, 0.0));
        assert!(collect_only.resolve(&mut store).is_empty());
        assert_eq!(health(&store, target), 1.0);
    }

    #[test]
    fn test_apply_strike_kills_boss() {
        let mut store = EntityStore::new();
        let boss = store.add(enemy(0.0, 30.0, 10.0, 1.0).with_tags(Tags::boss()));
        let events = apply_strike(&mut store, boss, 25.0);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Died { boss: true, .. })));
        assert!(apply_strike(&mut store, boss, 25.0).is_empty());
    }
}
