//! Collision detection and resolution.
//!
//! Pure functions over cell positions, sizes and ownership facts. The world
//! gathers those facts from its arenas and applies the results, so the rules
//! here are testable without a world:
//! - Rigid body collisions (pushing apart same-owner and same-team cells)
//! - Eating logic (when one cell consumes another)

use crate::config::Config;
use crate::entity::EntityId;
use crate::player::PlayerId;
use glam::Vec2;

pub const PLAYER_EAT_MULT: f32 = 1.15; // Predator must be 15% larger to eat
pub const MASS_CONVERSION: f32 = 100.0; // Mass = size² / 100

/// Contact between two cells found by an index query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manifold {
    /// Cell whose box was queried.
    pub a: EntityId,
    /// Cell the query returned.
    pub b: EntityId,
    /// Distance between centers.
    pub d: f32,
    /// Position of `b` relative to `a`.
    pub delta: Vec2,
}

/// Build the manifold between two cells.
#[inline]
pub fn check_cell_collision(a: EntityId, pos_a: Vec2, b: EntityId, pos_b: Vec2) -> Manifold {
    let delta = pos_b - pos_a;
    Manifold {
        a,
        b,
        d: delta.length(),
        delta,
    }
}

/// What the world knows about one side of a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Party {
    pub owner: Option<PlayerId>,
    pub team: Option<u8>,
    pub is_minion: bool,
    /// Age in ticks.
    pub age: u64,
    pub can_remerge: bool,
    pub size: f32,
}

/// Collision constants derived from the configuration and game mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRules {
    pub have_teams: bool,
    pub minion_collide_team: bool,
    /// Same-owner cells younger than this ignore each other.
    pub grace_ticks: u64,
    /// Prey may be eaten once its center is within
    /// `predator - prey / eat_divisor`.
    pub eat_divisor: f32,
}

impl CollisionRules {
    pub fn new(config: &Config, have_teams: bool) -> Self {
        Self {
            have_teams,
            minion_collide_team: config.server.minion_collide_team,
            grace_ticks: config.split_restore_ticks(),
            eat_divisor: config.eat_distance_divisor(),
        }
    }
}

/// How a contact found during the player pass is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Push the cells apart now.
    Rigid,
    /// Queue the pair for consumption.
    Consume,
    /// Freshly split siblings pass through each other.
    Ignore,
}

/// Classify a contact between `a` (the scanning cell) and `b`.
pub fn classify(a: &Party, b: &Party, rules: &CollisionRules) -> Contact {
    let (Some(owner_a), Some(owner_b)) = (a.owner, b.owner) else {
        return Contact::Consume;
    };

    if owner_a != owner_b {
        // Minions pass through their team unless configured otherwise
        if (rules.have_teams && b.is_minion) || (a.is_minion && !rules.minion_collide_team) {
            return Contact::Consume;
        }
        return if rules.have_teams && a.team == b.team {
            Contact::Rigid
        } else {
            Contact::Consume
        };
    }

    if a.age < rules.grace_ticks || b.age < rules.grace_ticks {
        return Contact::Ignore;
    }
    if !a.can_remerge || !b.can_remerge {
        Contact::Rigid
    } else {
        Contact::Consume
    }
}

/// Displacements that separate two overlapping cells, or `None` when they
/// do not overlap (or sit exactly on top of each other).
///
/// The push is shared by radius: the larger cell moves less.
#[inline]
pub fn resolve_rigid(m: &Manifold, size_a: f32, radius_a: f32, size_b: f32, radius_b: f32) -> Option<(Vec2, Vec2)> {
    if m.d == 0.0 {
        return None;
    }
    let push = (size_a + size_b - m.d) / m.d;
    if push <= 0.0 {
        return None;
    }

    let rt = radius_a + radius_b;
    let r1 = push * radius_a / rt;
    let r2 = push * radius_b / rt;
    Some((-m.delta * r2, m.delta * r1))
}

/// Center distance below which `predator_size` can swallow `prey_size`.
#[inline]
pub fn eat_threshold(predator_size: f32, prey_size: f32, divisor: f32) -> f32 {
    predator_size - prey_size / divisor
}

/// Order a pair as (prey, predator): the larger cell eats. On a tie the
/// scanned cell `b` is the predator.
#[inline]
pub fn order_by_size<'a>(a: &'a Party, b: &'a Party) -> (&'a Party, &'a Party, bool) {
    if a.size > b.size { (b, a, true) } else { (a, b, false) }
}

/// Whether `predator` swallows `prey` at center distance `d`.
///
/// `predator_accepts` is the predator's own can-eat gate for the prey's kind.
pub fn can_consume(prey: &Party, predator: &Party, d: f32, predator_accepts: bool, rules: &CollisionRules) -> bool {
    if d >= eat_threshold(predator.size, prey.size, rules.eat_divisor) {
        return false;
    }

    if prey.owner.is_some() && prey.owner == predator.owner {
        // Siblings merge once both are past the grace period and eligible
        return prey.age >= rules.grace_ticks
            && predator.age >= rules.grace_ticks
            && prey.can_remerge
            && predator.can_remerge;
    }

    predator.size >= prey.size * PLAYER_EAT_MULT && predator_accepts
}

/// Calculate mass from size.
#[inline]
pub fn size_to_mass(size: f32) -> f32 {
    (size * size) / MASS_CONVERSION
}

/// Calculate size from mass.
#[inline]
pub fn mass_to_size(mass: f32) -> f32 {
    (MASS_CONVERSION * mass).sqrt()
}
