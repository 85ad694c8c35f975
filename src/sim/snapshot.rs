//! Render-ready view of a session
//!
//! An owned copy taken at the tick boundary. The renderer can keep it as long
//! as it likes; nothing in it points back into the simulation.

use serde::Serialize;

use super::entity::{Entity, EntityKind, KindTag};
use super::state::{GamePhase, GameSession};

#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: KindTag,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub health: Option<f32>,
    pub max_health: Option<f32>,
    /// Health bar fill, 0..=1
    pub health_fraction: Option<f32>,
    pub shield: Option<f32>,
    pub boss: bool,
    pub invulnerable: bool,
    /// Colour hint: what a particle came from
    pub source: Option<KindTag>,
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        let vitals = entity.kind.vitals();
        let source = match &entity.kind {
            EntityKind::Particle(p) => Some(p.source),
            _ => None,
        };
        Self {
            id: entity.id.raw(),
            kind: entity.tag(),
            x: entity.pos.x,
            y: entity.pos.y,
            radius: entity.radius,
            health: vitals.map(|v| v.health),
            max_health: vitals.map(|v| v.max_health),
            health_fraction: vitals.map(|v| v.fraction()),
            shield: vitals.map(|v| v.shield).filter(|s| *s > 0.0),
            boss: entity.is_boss(),
            invulnerable: entity.kind.is_invulnerable(),
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    /// XP bar fill, 0..=1
    pub xp_fraction: f32,
    pub floor: u32,
    pub boss_fight: bool,
    pub entities: Vec<EntityView>,
}

impl Snapshot {
    pub fn capture(session: &GameSession) -> Self {
        let progression = session.progression();
        Self {
            tick: session.tick_count(),
            phase: session.phase(),
            level: progression.level,
            xp: progression.xp,
            xp_to_next_level: progression.xp_to_next_level,
            xp_fraction: progression.xp_fraction(),
            floor: progression.floor,
            boss_fight: progression.encounter.is_boss_fight(),
            entities: session
                .store()
                .iter()
                .filter(|e| e.is_alive())
                .map(EntityView::from)
                .collect(),
        }
    }

    pub fn count(&self, kind: KindTag) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }
}
