//! Per-tick motion
//!
//! Speeds are tuned against a fixed frame rate, so every displacement is
//! scaled by `delta_ms / reference_frame_ms`. Target positions are sampled
//! once before anything moves, which keeps results independent of store
//! order within a tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EdgePolicy, Entity, EntityId, KindTag, Motion};
use super::store::EntityStore;
use crate::{heading_of, normalize_angle, polar_to_cartesian};

/// Axis-aligned world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Edges inclusive
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Crossing one edge re-enters at the opposite one
    pub fn wrap(&self, mut pos: Vec2) -> Vec2 {
        if pos.x < self.min.x {
            pos.x = self.max.x;
        } else if pos.x > self.max.x {
            pos.x = self.min.x;
        }
        if pos.y < self.min.y {
            pos.y = self.max.y;
        } else if pos.y > self.max.y {
            pos.y = self.min.y;
        }
        pos
    }

    /// Keep a circle fully inside the world
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        let inset = Vec2::splat(radius);
        let lo = self.min + inset;
        let hi = (self.max - inset).max(lo);
        pos.clamp(lo, hi)
    }
}

/// Positions of live entities at the start of the tick, sorted by id
struct TargetSnapshot {
    positions: Vec<(EntityId, Vec2)>,
    enemies: Vec<Vec2>,
}

impl TargetSnapshot {
    fn capture(store: &EntityStore) -> Self {
        let positions = store
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| (e.id, e.pos))
            .collect();
        let enemies = store
            .iter_kind(KindTag::Enemy)
            .filter(|e| e.is_alive())
            .map(|e| e.pos)
            .collect();
        Self { positions, enemies }
    }

    fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.positions
            .binary_search_by_key(&id, |(id, _)| *id)
            .ok()
            .map(|i| self.positions[i].1)
    }

    /// Best homing target inside the cone around `launch_angle`
    fn homing_target(&self, from: Vec2, launch_angle: f32, cone: f32, weight: f32) -> Option<Vec2> {
        let mut best: Option<(f32, Vec2)> = None;
        for &enemy in &self.enemies {
            let offset = enemy - from;
            let diff = normalize_angle(heading_of(offset) - launch_angle).abs();
            if diff >= cone {
                continue;
            }
            let score = offset.length() * (1.0 + diff * weight);
            if best.is_none_or(|(s, _)| score < s) {
                best = Some((score, enemy));
            }
        }
        best.map(|(_, pos)| pos)
    }
}

/// Advance every entity by one tick of `delta_ms`
pub fn advance(store: &mut EntityStore, delta_ms: f32, bounds: &WorldBounds, reference_frame_ms: f32) {
    if delta_ms <= 0.0 || reference_frame_ms <= 0.0 {
        return;
    }
    let scale = delta_ms / reference_frame_ms;
    let targets = TargetSnapshot::capture(store);

    for entity in store.iter_mut() {
        if entity.despawn {
            continue;
        }
        apply_motion(entity, &targets, delta_ms, scale);

        if let Some(life) = entity.lifetime_ms.as_mut() {
            *life -= delta_ms;
            if *life <= 0.0 {
                entity.despawn = true;
            }
        }

        apply_edges(entity, bounds);
    }
}

fn apply_motion(entity: &mut Entity, targets: &TargetSnapshot, delta_ms: f32, scale: f32) {
    match &mut entity.motion {
        Motion::Static => {}
        Motion::Linear { vel } => {
            entity.pos += *vel * scale;
        }
        Motion::Seek {
            target,
            speed,
            heading,
        } => match targets.position_of(*target) {
            Some(goal) => {
                let offset = goal - entity.pos;
                let dist = offset.length();
                if dist <= f32::EPSILON {
                    log::trace!("{} coincides with seek target {}, holding", entity.id, target);
                    return;
                }
                let dir = offset / dist;
                *heading = dir;
                entity.pos += dir * (*speed * scale).min(dist);
            }
            // Target gone: keep walking the last heading
            None => entity.pos += *heading * *speed * scale,
        },
        Motion::Homing {
            heading,
            speed,
            launch_angle,
            cone,
            turn_rate,
            angle_weight,
        } => {
            if let Some(goal) = targets.homing_target(entity.pos, *launch_angle, *cone, *angle_weight) {
                let desired = heading_of(goal - entity.pos);
                *heading = normalize_angle(*heading + normalize_angle(desired - *heading) * *turn_rate);
            }
            entity.pos += polar_to_cartesian(*speed * scale, *heading);
        }
        Motion::Orbit {
            center,
            radius,
            angular_speed,
            phase,
            oscillation,
        } => {
            let Some(anchor) = targets.position_of(*center) else {
                log::trace!("{} lost its orbit centre {}", entity.id, center);
                entity.despawn = true;
                return;
            };
            *phase = normalize_angle(*phase + *angular_speed * delta_ms);
            let r = match oscillation {
                Some(osc) => {
                    osc.elapsed_ms += delta_ms;
                    *radius + osc.amplitude * (osc.elapsed_ms * osc.frequency).sin()
                }
                None => *radius,
            };
            entity.pos = anchor + polar_to_cartesian(r, *phase);
        }
        Motion::Attract { target, range, pull } => {
            if let Some(goal) = targets.position_of(*target)
                && entity.pos.distance(goal) < *range
            {
                entity.pos += (goal - entity.pos) * (*pull * scale).min(1.0);
            }
        }
    }
}

fn apply_edges(entity: &mut Entity, bounds: &WorldBounds) {
    if bounds.contains(entity.pos) {
        if entity.edge == EdgePolicy::Clamp {
            entity.pos = bounds.clamp(entity.pos, entity.radius);
        }
        return;
    }
    if entity.tags.removable_offscreen {
        entity.despawn = true;
        return;
    }
    match entity.edge {
        EdgePolicy::Wrap => entity.pos = bounds.wrap(entity.pos),
        EdgePolicy::Clamp => entity.pos = bounds.clamp(entity.pos, entity.radius),
        EdgePolicy::Free => {}
    }
}
