//! Native Ogar world simulation engine.
//!
//! A single-threaded, fixed-step simulation of an Agar.io world: food,
//! viruses, ejected mass and player cells in a bounded arena, indexed by a
//! quad-tree and advanced one tick at a time by [`World::tick`].

pub mod collision;
pub mod config;
pub mod diff;
pub mod entity;
pub mod error;
pub mod gamemodes;
pub mod geometry;
pub mod lifecycle;
pub mod player;
pub mod spatial;
mod tick;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use diff::{EntitySnapshot, TickDiff};
pub use entity::{Cell, CellKind, Entity, EntityId};
pub use error::{ConfigError, WorldError};
pub use gamemodes::LeaderboardEntry;
pub use geometry::Bounds;
pub use player::{Player, PlayerId};
pub use world::{CellCounts, SimState, World, WorldStats};
