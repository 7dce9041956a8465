//! Game modes: per-mode rules layered on the core simulation.

use crate::player::{Player, PlayerId};
use crate::world::World;
use rand::rngs::StdRng;

pub mod ffa;
pub mod teams;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// Owning player, or `None` for a team row.
    pub player: Option<PlayerId>,
    pub name: String,
    /// Total mass for players, share of all player mass (0 to 1) for teams.
    pub score: f32,
}

pub trait GameMode: Send + Sync {
    fn name(&self) -> &str;
    fn id(&self) -> u32;

    /// Whether same-team cells of different players collide rigidly.
    fn have_teams(&self) -> bool {
        false
    }

    /// Multiplier applied to the player size decay rate.
    fn decay_mod(&self) -> f32 {
        1.0
    }

    /// Pick color (and team) for a player about to spawn.
    fn on_player_spawn(&self, player: &mut Player, rng: &mut StdRng);

    /// Runs once per tick, after collisions.
    fn on_tick(&mut self, _world: &mut World) {}

    /// Rank the world's players, highest score first.
    fn leaderboard(&self, world: &World) -> Vec<LeaderboardEntry>;
}

pub fn get_gamemode(id: u32) -> Box<dyn GameMode> {
    match id {
        1 => Box::new(teams::Teams::new()),
        _ => Box::new(ffa::Ffa::new()),
    }
}
