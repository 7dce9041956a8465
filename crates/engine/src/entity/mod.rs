//! Game entities (cells).
//!
//! This module defines all cell types in the game and the closed
//! [`Entity`] enum the world stores them in.

mod cell;
mod ejected_mass;
mod entry;
mod food;
mod player_cell;
mod virus;

pub use cell::{Boost, Cell, CellData, CellKind, Color};
pub use ejected_mass::EjectedMass;
pub use entry::{Entity, EntityId};
pub use food::Food;
pub use player_cell::PlayerCell;
pub use virus::{VIRUS_COLOR, Virus};
