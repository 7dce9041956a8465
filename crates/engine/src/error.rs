//! Engine error types.

use crate::entity::EntityId;
use crate::player::PlayerId;
use thiserror::Error;

/// Errors found while validating a configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Border must have a positive area, got {width}x{height}")]
    InvalidBorder { width: f64, height: f64 },

    #[error("Tick interval must be at least 1ms")]
    ZeroTickInterval,

    #[error("{section}.{field} must be positive, got {value}")]
    NonPositive {
        section: &'static str,
        field: &'static str,
        value: f64,
    },

    #[error("{section}: min_size ({min}) is larger than max_size ({max})")]
    InvertedSizeRange {
        section: &'static str,
        min: f64,
        max: f64,
    },

    #[error("player.max_cells must be at least 1")]
    ZeroMaxCells,
}

/// Recoverable misuse of the world API.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    #[error("Unknown player {0:?}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown entity {0:?}")]
    UnknownEntity(EntityId),

    #[error("Entity size must be finite and positive, got {0}")]
    DegenerateSize(f32),

    #[error("Player cells must have an owner")]
    MissingOwner,
}
