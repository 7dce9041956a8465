//! Simulation configuration.
//!
//! The engine only reads these values; loading lives here so every binary
//! shares the same `config.toml` layout.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub border: BorderConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub virus: VirusConfig,
    #[serde(default)]
    pub eject: EjectConfig,
}

impl Config {
    /// Load configuration from `config.toml`, writing the defaults if it
    /// does not exist yet.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let border = &self.border;
        if !(border.width > 0.0 && border.height > 0.0) {
            return Err(ConfigError::InvalidBorder {
                width: border.width,
                height: border.height,
            });
        }
        if self.server.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.player.max_cells == 0 {
            return Err(ConfigError::ZeroMaxCells);
        }

        let positive = [
            ("player", "start_size", self.player.start_size),
            ("player", "min_size", self.player.min_size),
            ("player", "max_size", self.player.max_size),
            ("food", "min_size", self.food.min_size),
            ("virus", "min_size", self.virus.min_size),
            ("virus", "max_popped_size", self.virus.max_popped_size),
            ("eject", "size", self.eject.size),
        ];
        for (section, field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { section, field, value });
            }
        }

        let ranges = [
            ("player", self.player.min_size, self.player.max_size),
            ("food", self.food.min_size, self.food.max_size),
            ("virus", self.virus.min_size, self.virus.max_size),
        ];
        for (section, min, max) in ranges {
            if min > max {
                return Err(ConfigError::InvertedSizeRange { section, min, max });
            }
        }
        Ok(())
    }

    /// Simulation ticks per second of game time.
    #[inline]
    pub fn ticks_per_second(&self) -> u64 {
        (1000 / self.server.tick_interval_ms.max(1)).max(1)
    }

    /// Ticks a freshly split cell ignores its siblings for.
    #[inline]
    pub fn split_restore_ticks(&self) -> u64 {
        if self.server.mobile_physics { 1 } else { 13 }
    }

    /// Divisor in the eat-distance threshold `predator - prey / div`.
    #[inline]
    pub fn eat_distance_divisor(&self) -> f32 {
        if self.server.mobile_physics { 20.0 } else { 3.0 }
    }

    /// Tick count after which the world restarts itself, if enabled.
    #[inline]
    pub fn restart_ticks(&self) -> Option<u64> {
        match self.server.restart_minutes {
            0 => None,
            minutes => Some(minutes * 60 * self.ticks_per_second()),
        }
    }

    /// Cell-count ceiling used by virus explosions.
    #[inline]
    pub fn virus_max_cells(&self) -> usize {
        match self.virus.max_cells {
            0 => self.player.max_cells,
            n => n,
        }
    }

    /// Minimum fragment mass for virus explosions.
    #[inline]
    pub fn virus_split_min_mass(&self) -> f32 {
        let size = self.virus.max_popped_size as f32;
        size * size / 100.0
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Game mode (0=FFA, 1=Teams).
    #[serde(default)]
    pub gamemode: u32,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Mobile physics (looser eat threshold, faster remerge, no auto-split).
    #[serde(default)]
    pub mobile_physics: bool,
    /// Restart the world every N minutes (0 = never).
    #[serde(default)]
    pub restart_minutes: u64,
    /// Whether minions collide rigidly with their team.
    #[serde(default)]
    pub minion_collide_team: bool,
    /// Fixed RNG seed for reproducible worlds.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gamemode: 0,
            tick_interval_ms: default_tick_interval(),
            mobile_physics: false,
            restart_minutes: 0,
            minion_collide_team: false,
            seed: None,
        }
    }
}

fn default_tick_interval() -> u64 {
    40
}

/// World border configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BorderConfig {
    #[serde(default = "default_border_size")]
    pub width: f64,
    #[serde(default = "default_border_size")]
    pub height: f64,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            width: default_border_size(),
            height: default_border_size(),
        }
    }
}

fn default_border_size() -> f64 {
    14142.0
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_start_size")]
    pub start_size: f64,
    #[serde(default = "default_player_min_size")]
    pub min_size: f64,
    #[serde(default = "default_player_max_size")]
    pub max_size: f64,
    #[serde(default = "default_player_min_split")]
    pub min_split_size: f64,
    #[serde(default = "default_player_min_eject")]
    pub min_eject_size: f64,
    #[serde(default = "default_player_max_cells")]
    pub max_cells: usize,
    #[serde(default = "default_player_speed")]
    pub speed: f64,
    #[serde(default = "default_player_decay_rate")]
    pub decay_rate: f64,
    /// Mass above which decay runs ten times faster (0 = no cap).
    #[serde(default)]
    pub decay_cap: f64,
    /// Seconds before split cells may remerge (0 = once boost settles).
    #[serde(default = "default_player_merge_time")]
    pub merge_time: f64,
    #[serde(default = "default_player_split_speed")]
    pub split_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_size: default_player_start_size(),
            min_size: default_player_min_size(),
            max_size: default_player_max_size(),
            min_split_size: default_player_min_split(),
            min_eject_size: default_player_min_eject(),
            max_cells: default_player_max_cells(),
            speed: default_player_speed(),
            decay_rate: default_player_decay_rate(),
            decay_cap: 0.0,
            merge_time: default_player_merge_time(),
            split_speed: default_player_split_speed(),
        }
    }
}

fn default_player_start_size() -> f64 {
    30.0
}
fn default_player_min_size() -> f64 {
    30.0
}
fn default_player_max_size() -> f64 {
    1500.0
}
fn default_player_min_split() -> f64 {
    60.0
}
fn default_player_min_eject() -> f64 {
    60.0
}
fn default_player_max_cells() -> usize {
    16
}
fn default_player_speed() -> f64 {
    30.0
}
fn default_player_decay_rate() -> f64 {
    0.002
}
fn default_player_merge_time() -> f64 {
    30.0
}
fn default_player_split_speed() -> f64 {
    780.0
}

/// Food configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    #[serde(default = "default_food_min_size")]
    pub min_size: f64,
    #[serde(default = "default_food_max_size")]
    pub max_size: f64,
    #[serde(default = "default_food_min_amount")]
    pub min_amount: usize,
    #[serde(default = "default_food_max_amount")]
    pub max_amount: usize,
    #[serde(default = "default_food_spawn_amount")]
    pub spawn_amount: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            min_size: default_food_min_size(),
            max_size: default_food_max_size(),
            min_amount: default_food_min_amount(),
            max_amount: default_food_max_amount(),
            spawn_amount: default_food_spawn_amount(),
        }
    }
}

fn default_food_min_size() -> f64 {
    10.0
}
fn default_food_max_size() -> f64 {
    20.0
}
fn default_food_min_amount() -> usize {
    1500
}
fn default_food_max_amount() -> usize {
    3000
}
fn default_food_spawn_amount() -> usize {
    30
}

/// Virus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VirusConfig {
    #[serde(default = "default_virus_min_size")]
    pub min_size: f64,
    #[serde(default = "default_virus_max_size")]
    pub max_size: f64,
    #[serde(default = "default_virus_min_amount")]
    pub min_amount: usize,
    #[serde(default = "default_virus_max_amount")]
    pub max_amount: usize,
    /// Launch distance of a virus shot by an overfed virus.
    #[serde(default = "default_virus_velocity")]
    pub velocity: f64,
    /// Maximum total cells a player can have after a virus pop
    /// (0 falls back to `player.max_cells`).
    #[serde(default = "default_virus_max_cells")]
    pub max_cells: usize,
    /// Size of the smallest piece a virus pop aims for; its mass is the
    /// minimum split mass of the distribution.
    #[serde(default = "default_virus_max_popped_size")]
    pub max_popped_size: f64,
    /// Split into equal pieces instead of power-of-two / half-half pieces.
    #[serde(default)]
    pub equal_pop_size: bool,
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            min_size: default_virus_min_size(),
            max_size: default_virus_max_size(),
            min_amount: default_virus_min_amount(),
            max_amount: default_virus_max_amount(),
            velocity: default_virus_velocity(),
            max_cells: default_virus_max_cells(),
            max_popped_size: default_virus_max_popped_size(),
            equal_pop_size: false,
        }
    }
}

fn default_virus_min_size() -> f64 {
    100.0
}
fn default_virus_max_size() -> f64 {
    141.4
}
fn default_virus_min_amount() -> usize {
    50
}
fn default_virus_max_amount() -> usize {
    100
}
fn default_virus_velocity() -> f64 {
    780.0
}
fn default_virus_max_cells() -> usize {
    16
}
fn default_virus_max_popped_size() -> f64 {
    60.0
}

/// Ejected mass configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EjectConfig {
    #[serde(default = "default_eject_size")]
    pub size: f64,
    #[serde(default = "default_eject_size_loss")]
    pub size_loss: f64,
    #[serde(default = "default_eject_speed")]
    pub speed: f64,
    /// Minimum ticks between two ejects of the same player.
    #[serde(default = "default_eject_cooldown")]
    pub cooldown: u64,
    /// Chance that a player spawns from a settled ejected mass.
    #[serde(default = "default_eject_spawn_percent")]
    pub spawn_percent: f64,
    /// Eject viruses instead of mass.
    #[serde(default)]
    pub eject_virus: bool,
}

impl Default for EjectConfig {
    fn default() -> Self {
        Self {
            size: default_eject_size(),
            size_loss: default_eject_size_loss(),
            speed: default_eject_speed(),
            cooldown: default_eject_cooldown(),
            spawn_percent: default_eject_spawn_percent(),
            eject_virus: false,
        }
    }
}

fn default_eject_size() -> f64 {
    36.056
}
fn default_eject_size_loss() -> f64 {
    41.231
}
fn default_eject_speed() -> f64 {
    780.0
}
fn default_eject_cooldown() -> u64 {
    2
}
fn default_eject_spawn_percent() -> f64 {
    0.5
}
