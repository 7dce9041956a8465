//! Closed set of entity variants stored by the world.

use super::cell::{Cell, CellData, CellKind};
use super::{EjectedMass, Food, PlayerCell, Virus};
use crate::player::PlayerId;
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle for entities backed by a generational slot map.
    pub struct EntityId;
}

/// An entity in the world.
#[derive(Debug, Clone)]
pub enum Entity {
    Player(PlayerCell),
    Food(Food),
    Virus(Virus),
    Eject(EjectedMass),
}

impl Entity {
    /// Get the common cell data.
    #[inline]
    pub fn data(&self) -> &CellData {
        match self {
            Entity::Player(c) => c.data(),
            Entity::Food(c) => c.data(),
            Entity::Virus(c) => c.data(),
            Entity::Eject(c) => c.data(),
        }
    }

    /// Get mutable cell data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut CellData {
        match self {
            Entity::Player(c) => c.data_mut(),
            Entity::Food(c) => c.data_mut(),
            Entity::Virus(c) => c.data_mut(),
            Entity::Eject(c) => c.data_mut(),
        }
    }

    #[inline]
    pub fn kind(&self) -> CellKind {
        match self {
            Entity::Player(c) => c.kind(),
            Entity::Food(c) => c.kind(),
            Entity::Virus(c) => c.kind(),
            Entity::Eject(c) => c.kind(),
        }
    }

    /// Whether this entity would eat `prey` given the virus cap state.
    #[inline]
    pub fn can_eat(&self, prey: CellKind, virus_room: bool) -> bool {
        match self {
            Entity::Player(c) => c.can_eat(prey, virus_room),
            Entity::Food(c) => c.can_eat(prey, virus_room),
            Entity::Virus(c) => c.can_eat(prey, virus_room),
            Entity::Eject(c) => c.can_eat(prey, virus_room),
        }
    }

    #[inline]
    pub fn owner(&self) -> Option<PlayerId> {
        self.data().owner
    }

    /// Remerge flag; entities other than player cells always report true.
    #[inline]
    pub fn can_remerge(&self) -> bool {
        match self {
            Entity::Player(c) => c.can_remerge,
            _ => true,
        }
    }
}

impl From<PlayerCell> for Entity {
    fn from(cell: PlayerCell) -> Self {
        Entity::Player(cell)
    }
}

impl From<Food> for Entity {
    fn from(cell: Food) -> Self {
        Entity::Food(cell)
    }
}

impl From<Virus> for Entity {
    fn from(cell: Virus) -> Self {
        Entity::Virus(cell)
    }
}

impl From<EjectedMass> for Entity {
    fn from(cell: EjectedMass) -> Self {
        Entity::Eject(cell)
    }
}
