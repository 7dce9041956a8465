//! Per-tick change sets.
//!
//! The world records changes as they happen and hands the accumulated
//! [`TickDiff`] to the caller at the end of [`World::tick`](crate::World::tick).
//! Snapshots of added and updated entities are taken when the diff is
//! collected, so they always describe the entity's final state for the tick.

use crate::entity::{CellKind, Color, Entity, EntityId};
use crate::player::PlayerId;
use glam::Vec2;
use slotmap::{SecondaryMap, SlotMap};

/// Read-only view of an entity for encoders and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    pub node_id: u32,
    pub kind: CellKind,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
    pub owner: Option<PlayerId>,
}

impl EntitySnapshot {
    pub fn of(entity: &Entity) -> Self {
        let data = entity.data();
        Self {
            node_id: data.node_id,
            kind: entity.kind(),
            position: data.position,
            size: data.size(),
            color: data.color,
            owner: data.owner,
        }
    }
}

/// Everything that changed during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickDiff {
    /// Entities created this tick that are still alive.
    pub added: Vec<EntitySnapshot>,
    /// Pre-existing entities that moved or changed size.
    pub updated: Vec<EntitySnapshot>,
    /// `(prey, predator)` node IDs.
    pub eaten: Vec<(u32, u32)>,
    /// Entities removed for any reason other than being eaten.
    pub removed: Vec<EntitySnapshot>,
    /// The world restarted; clients should drop everything they know.
    pub reset: bool,
}

impl TickDiff {
    pub fn is_empty(&self) -> bool {
        !self.reset
            && self.added.is_empty()
            && self.updated.is_empty()
            && self.eaten.is_empty()
            && self.removed.is_empty()
    }
}

/// Accumulates changes between two calls to [`DiffBuilder::finish`].
#[derive(Debug, Default)]
pub(crate) struct DiffBuilder {
    added: Vec<EntityId>,
    fresh: SecondaryMap<EntityId, ()>,
    updated: SecondaryMap<EntityId, ()>,
    eaten: Vec<(u32, u32)>,
    removed: Vec<EntitySnapshot>,
    reset: bool,
}

impl DiffBuilder {
    pub fn added(&mut self, id: EntityId) {
        self.added.push(id);
        self.fresh.insert(id, ());
    }

    pub fn updated(&mut self, id: EntityId) {
        if !self.fresh.contains_key(id) {
            self.updated.insert(id, ());
        }
    }

    pub fn eaten(&mut self, prey: u32, predator: u32) {
        self.eaten.push((prey, predator));
    }

    pub fn removed(&mut self, snapshot: EntitySnapshot) {
        self.removed.push(snapshot);
    }

    /// Forget everything recorded so far and flag the diff as a reset.
    pub fn reset(&mut self) {
        *self = Self {
            reset: true,
            ..Default::default()
        };
    }

    /// Snapshot surviving entities and start a new diff.
    pub fn finish(&mut self, entities: &SlotMap<EntityId, Entity>) -> TickDiff {
        let taken = std::mem::take(self);
        let added = taken
            .added
            .iter()
            .filter_map(|&id| entities.get(id))
            .map(EntitySnapshot::of)
            .collect();
        let updated = taken
            .updated
            .keys()
            .filter_map(|id| entities.get(id))
            .map(EntitySnapshot::of)
            .collect();

        TickDiff {
            added,
            updated,
            eaten: taken.eaten,
            removed: taken.removed,
            reset: taken.reset,
        }
    }
}
