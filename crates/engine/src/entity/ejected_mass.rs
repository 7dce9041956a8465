//! Ejected mass cell.

use super::cell::{Cell, CellData, CellKind};
use glam::Vec2;

/// Mass ejected by a player (W key).
#[derive(Debug, Clone)]
pub struct EjectedMass {
    data: CellData,
}

impl EjectedMass {
    pub fn new(node_id: u32, position: Vec2, size: f32, tick: u64) -> Self {
        Self {
            data: CellData::new(node_id, position, size, tick),
        }
    }
}

impl Cell for EjectedMass {
    fn data(&self) -> &CellData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.data
    }

    fn kind(&self) -> CellKind {
        CellKind::EjectedMass
    }
}
