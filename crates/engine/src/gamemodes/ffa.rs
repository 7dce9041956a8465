use super::{GameMode, LeaderboardEntry};
use crate::entity::Color;
use crate::player::Player;
use crate::world::World;
use rand::rngs::StdRng;

pub struct Ffa;

impl Ffa {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Ffa {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMode for Ffa {
    fn name(&self) -> &str { "Free For All" }
    fn id(&self) -> u32 { 0 }

    fn on_player_spawn(&self, player: &mut Player, rng: &mut StdRng) {
        player.color = Color::random(rng);
    }

    fn on_tick(&mut self, world: &mut World) {
        world.replenish();
    }

    fn leaderboard(&self, world: &World) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = world
            .players()
            .filter(|(_, player)| player.is_alive() && !player.is_minion)
            .map(|(id, player)| LeaderboardEntry {
                player: Some(id),
                name: if player.name.is_empty() {
                    "An unnamed cell".to_string()
                } else {
                    player.name.clone()
                },
                score: world.player_mass(id),
            })
            .collect();

        entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }
}
