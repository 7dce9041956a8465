//! Virus cell.

use super::cell::{Cell, CellData, CellKind, Color};
use glam::Vec2;

/// Default virus color (green).
pub const VIRUS_COLOR: Color = Color::new(0x33, 0xff, 0x33);

/// A virus that pops player cells which eat it.
#[derive(Debug, Clone)]
pub struct Virus {
    data: CellData,
}

impl Virus {
    pub fn new(node_id: u32, position: Vec2, size: f32, tick: u64) -> Self {
        let mut data = CellData::new(node_id, position, size, tick);
        data.color = VIRUS_COLOR;
        Self { data }
    }
}

impl Cell for Virus {
    fn data(&self) -> &CellData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.data
    }

    fn kind(&self) -> CellKind {
        CellKind::Virus
    }

    /// Viruses eat ejected mass only, and only below the virus cap.
    fn can_eat(&self, prey: CellKind, virus_room: bool) -> bool {
        virus_room && prey == CellKind::EjectedMass
    }
}
