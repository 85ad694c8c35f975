//! Entity storage for a single session
//!
//! Entities live in one `Vec` kept sorted by id. Ids grow monotonically and
//! removal preserves order, so iteration order is always insertion order and
//! lookups are a binary search.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, KindTag};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: u32,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            // 0 is EntityId::UNASSIGNED
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an entity, assigning it a fresh id
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_entity_id();
        entity.id = id;
        self.entities.push(entity);
        id
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    /// Position of a live entity (used to resolve motion targets)
    pub fn position_of(&self, id: EntityId) -> Option<glam::Vec2> {
        self.get(id).filter(|e| e.is_alive()).map(|e| e.pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Entities of one kind, in id order
    pub fn iter_kind(&self, kind: KindTag) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.tag() == kind)
    }

    /// Live (not flagged) entities of one kind
    pub fn count(&self, kind: KindTag) -> usize {
        self.iter_kind(kind).filter(|e| e.is_alive()).count()
    }

    /// First live entity of a kind (the player, the objective)
    pub fn first_of(&self, kind: KindTag) -> Option<&Entity> {
        self.iter_kind(kind).find(|e| e.is_alive())
    }

    /// Closest live entity of a kind to `from`
    pub fn nearest(&self, kind: KindTag, from: glam::Vec2) -> Option<&Entity> {
        self.iter_kind(kind).filter(|e| e.is_alive()).min_by(|a, b| {
            a.pos
                .distance_squared(from)
                .partial_cmp(&b.pos.distance_squared(from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Remove and return every entity matching `pred`
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<Entity>
    where
        F: FnMut(&Entity) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entities.len());
        for entity in self.entities.drain(..) {
            if pred(&entity) {
                removed.push(entity);
            } else {
                kept.push(entity);
            }
        }
        self.entities = kept;
        removed
    }

    /// Drop everything flagged `despawn`; returns how many went
    pub fn sweep(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| !e.despawn);
        before - self.entities.len()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove all entities; ids are still never reused
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityKind, PickupData};
    use glam::Vec2;

    fn orb(x: f32) -> Entity {
        Entity::new(EntityKind::Pickup(PickupData { xp: 3 }), Vec2::new(x, 0.0), 4.0).unwrap()
    }

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let mut store = EntityStore::new();
        let a = store.add(orb(0.0));
        let b = store.add(orb(1.0));
        assert!(b > a);
        store.remove_where(|e| e.id == b);
        store.clear();
        let c = store.add(orb(2.0));
        assert!(c > b);
    }

    #[test]
    fn test_lookup_after_removal() {
        let mut store = EntityStore::new();
        let ids: Vec<_> = (0..5).map(|i| store.add(orb(i as f32))).collect();
        let removed = store.remove_where(|e| e.pos.x == 1.0 || e.pos.x == 3.0);
        assert_eq!(removed.len(), 2);
        assert!(store.get(ids[1]).is_none());
        assert_eq!(store.get(ids[4]).map(|e| e.pos.x), Some(4.0));
        let order: Vec<f32> = store.iter().map(|e| e.pos.x).collect();
        assert_eq!(order, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_sweep_removes_flagged() {
        let mut store = EntityStore::new();
        let id = store.add(orb(0.0));
        store.add(orb(1.0));
        store.get_mut(id).unwrap().despawn = true;
        assert_eq!(store.count(KindTag::Pickup), 1);
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.first_of(KindTag::Player).is_none());
    }
}
