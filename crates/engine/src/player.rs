//! Player records: the owners of player cells.
//!
//! Transport, naming and AI live outside the engine; this is only the state
//! the simulation reads each tick (aim point, flags) and the list of cells a
//! player controls.

use crate::entity::{Color, EntityId};
use glam::Vec2;
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle for players backed by a generational slot map.
    pub struct PlayerId;
}

/// Per-player simulation state. Inputs are last-write-wins between ticks.
#[derive(Debug, Clone, Default)]
pub struct Player {
    /// Display name (not used by the simulation).
    pub name: String,
    /// Color given to newly spawned cells.
    pub color: Color,
    /// Aim point in world coordinates.
    pub target: Vec2,
    /// Cells owned by this player, oldest first.
    pub cells: Vec<EntityId>,
    /// Team index in team game modes.
    pub team: Option<u8>,
    /// Whether this player is a minion of another player.
    pub is_minion: bool,
    /// Frozen players neither move nor eject.
    pub frozen: bool,
    /// Ignore size limits and merge as soon as boosts settle.
    pub merge_override: bool,
    /// "Rec" mode: instant merge, huge size limit, up to 200 cells.
    pub rec_mode: bool,
    /// Spawn size override.
    pub spawn_size: Option<f32>,
    /// Tick of the last accepted eject.
    pub last_eject_tick: Option<u64>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the player currently controls any cell.
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Cell limit for manual splits.
    #[inline]
    pub fn max_cells(&self, configured: usize) -> usize {
        if self.rec_mode { 200 } else { configured }
    }

    /// Record an eject attempt, returning false while on cooldown.
    pub fn try_eject(&mut self, tick: u64, cooldown: u64) -> bool {
        if let Some(last) = self.last_eject_tick {
            if tick.saturating_sub(last) < cooldown {
                return false;
            }
        }
        self.last_eject_tick = Some(tick);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eject_cooldown() {
        let mut player = Player::new("test");
        assert!(player.try_eject(10, 2));
        assert!(!player.try_eject(11, 2));
        assert!(player.try_eject(12, 2));
    }

    #[test]
    fn test_rec_mode_cell_limit() {
        let mut player = Player::new("rec");
        assert_eq!(player.max_cells(16), 16);
        player.rec_mode = true;
        assert_eq!(player.max_cells(16), 200);
    }
}
