//! Food pellet cell.

use super::cell::{Cell, CellData, CellKind};
use glam::Vec2;

/// A food pellet that can be eaten by players.
#[derive(Debug, Clone)]
pub struct Food {
    data: CellData,
}

impl Food {
    pub fn new(node_id: u32, position: Vec2, size: f32, tick: u64) -> Self {
        Self {
            data: CellData::new(node_id, position, size, tick),
        }
    }
}

impl Cell for Food {
    fn data(&self) -> &CellData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.data
    }

    fn kind(&self) -> CellKind {
        CellKind::Food
    }
}
