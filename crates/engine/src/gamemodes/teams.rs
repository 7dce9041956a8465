use super::{GameMode, LeaderboardEntry};
use crate::entity::Color;
use crate::player::Player;
use crate::world::World;
use rand::Rng;
use rand::rngs::StdRng;

pub const TEAM_COUNT: u8 = 3;

pub struct Teams;

impl Teams {
    pub fn new() -> Self {
        Self
    }

    /// Base team color with a little random brightness on each channel.
    pub fn team_color(team: u8, rng: &mut StdRng) -> Color {
        let fuzz = 38;

        let base_color = match team {
            0 => (255, 0, 0), // Red
            1 => (0, 255, 0), // Green
            _ => (0, 0, 255), // Blue
        };

        let r = (base_color.0 + rng.random_range(0..fuzz)).min(255) as u8;
        let g = (base_color.1 + rng.random_range(0..fuzz)).min(255) as u8;
        let b = (base_color.2 + rng.random_range(0..fuzz)).min(255) as u8;

        Color::new(r, g, b)
    }
}

impl Default for Teams {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMode for Teams {
    fn name(&self) -> &str { "Teams" }
    fn id(&self) -> u32 { 1 }

    fn have_teams(&self) -> bool {
        true
    }

    fn on_player_spawn(&self, player: &mut Player, rng: &mut StdRng) {
        let team = *player
            .team
            .get_or_insert_with(|| rng.random_range(0..TEAM_COUNT));
        player.color = Self::team_color(team, rng);
    }

    fn on_tick(&mut self, world: &mut World) {
        world.replenish();
    }

    /// One row per team with its share of all player mass, in team order.
    /// Empty while no player has a cell.
    fn leaderboard(&self, world: &World) -> Vec<LeaderboardEntry> {
        let mut team_mass = [0.0f32; TEAM_COUNT as usize];
        for (id, player) in world.players() {
            let Some(team) = player.team else { continue };
            team_mass[(team as usize).min(team_mass.len() - 1)] += world.player_mass(id);
        }

        let total_mass: f32 = team_mass.iter().sum();
        if total_mass <= 0.0 {
            return Vec::new();
        }

        team_mass
            .iter()
            .enumerate()
            .map(|(team, mass)| LeaderboardEntry {
                player: None,
                name: format!("Team {}", team),
                score: mass / total_mass,
            })
            .collect()
    }
}
