//! Player cell.

use super::cell::{Cell, CellData, CellKind};
use crate::player::PlayerId;
use glam::Vec2;

/// Below this boost distance a cell in instant-merge mode may remerge.
const INSTANT_MERGE_BOOST: f32 = 100.0;

/// A cell controlled by a player.
#[derive(Debug, Clone)]
pub struct PlayerCell {
    /// Cell data (public for direct access).
    pub cell_data: CellData,
    /// Whether this cell can remerge with siblings.
    pub can_remerge: bool,
}

impl PlayerCell {
    /// Create a new player cell.
    pub fn new(node_id: u32, owner: PlayerId, position: Vec2, size: f32, tick: u64) -> Self {
        let mut data = CellData::new(node_id, position, size, tick);
        data.owner = Some(owner);
        Self {
            cell_data: data,
            can_remerge: false,
        }
    }

    /// Owning player. Always set for player cells.
    #[inline]
    pub fn owner(&self) -> Option<PlayerId> {
        self.cell_data.owner
    }

    /// Update merge status.
    ///
    /// With no merge time (or an instant-merge owner) the cell may remerge
    /// once its boost has mostly settled; otherwise once its age reaches
    /// `max(merge_time, size * 0.2)` seconds.
    pub fn update_merge(&mut self, current_tick: u64, merge_time: f32, instant: bool, ticks_per_second: u64) -> bool {
        if merge_time <= 0.0 || instant {
            self.can_remerge = self.cell_data.boost_distance() < INSTANT_MERGE_BOOST;
            return self.can_remerge;
        }

        let seconds = merge_time.max(self.cell_data.size() * 0.2);
        let ticks = (seconds * ticks_per_second as f32) as u64;
        self.can_remerge = self.cell_data.age(current_tick) >= ticks;
        self.can_remerge
    }

    /// Fraction of the aim vector to travel this tick.
    ///
    /// Step length is `2.2 * size^-0.439 * 40 * (player_speed / 30)`, never
    /// overshooting the aim point. Inside the 1-unit dead zone the cell does
    /// not move at all.
    pub fn speed_factor(&self, distance: f32, player_speed: f32) -> f32 {
        if !(distance >= 1.0) {
            return 0.0;
        }
        let step = 2.2 * self.cell_data.size().powf(-0.439) * 40.0 * (player_speed / 30.0);
        step.min(distance) / distance
    }
}

impl Cell for PlayerCell {
    fn data(&self) -> &CellData {
        &self.cell_data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.cell_data
    }

    fn kind(&self) -> CellKind {
        CellKind::Player
    }

    fn can_eat(&self, _prey: CellKind, _virus_room: bool) -> bool {
        true
    }
}
