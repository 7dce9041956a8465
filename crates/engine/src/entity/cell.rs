//! Base cell type and common functionality.

use crate::geometry::{Bounds, direction_from_angle};
use crate::player::PlayerId;
use crate::spatial::QuadHandle;
use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

const MASS_DIVISOR: f32 = 100.0; // mass = radius / 100

/// RGB color used for cells. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// One saturated channel, one dark channel and one random channel,
    /// in random order.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut rgb = [0xFF, 0x07, rng.random::<u8>()];
        rgb.shuffle(rng);
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

/// Cell type, with the discriminants the Ogar protocol uses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    #[default]
    Player = 0,
    Food = 1,
    Virus = 2,
    EjectedMass = 3,
}

/// Residual launch velocity from a split, eject or virus shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boost {
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Remaining distance to travel.
    pub distance: f32,
}

impl Boost {
    /// Below this distance a boost is considered spent.
    pub const SETTLED: f32 = 1.0;
    /// Each tick the cell covers `distance / DECAY_DIVISOR`.
    pub const DECAY_DIVISOR: f32 = 9.0;

    #[inline]
    pub fn from_angle(distance: f32, angle: f32) -> Self {
        Self {
            direction: direction_from_angle(angle),
            distance,
        }
    }

    /// Advance one tick, returning how far the cell moves.
    #[inline]
    pub fn step(&mut self) -> f32 {
        let speed = self.distance / Self::DECAY_DIVISOR;
        self.distance -= speed;
        speed
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.distance < Self::SETTLED
    }
}

/// Common cell data shared by all cell types.
#[derive(Debug, Clone)]
pub struct CellData {
    /// World-unique node ID reported to protocol encoders. Never 0.
    pub node_id: u32,
    /// Owning player (player cells only).
    pub owner: Option<PlayerId>,
    /// Position in world coordinates.
    pub position: Vec2,
    /// Cell size (sqrt of mass * 100).
    size: f32,
    /// size², the additive quantity when cells merge.
    radius: f32,
    /// radius / 100.
    mass: f32,
    pub color: Color,
    /// Tick when the cell was born.
    pub tick_of_birth: u64,
    pub boost: Option<Boost>,
    /// Node ID of the cell that ate this one.
    pub killed_by: Option<u32>,
    /// Entry in the world's spatial index.
    pub(crate) spatial: QuadHandle,
}

impl CellData {
    pub fn new(node_id: u32, position: Vec2, size: f32, tick: u64) -> Self {
        let radius = size * size;
        Self {
            node_id,
            owner: None,
            position,
            size,
            radius,
            mass: radius / MASS_DIVISOR,
            color: Color::default(),
            tick_of_birth: tick,
            boost: None,
            killed_by: None,
            spatial: QuadHandle::default(),
        }
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the cell size and update radius/mass.
    #[inline]
    pub fn set_size(&mut self, size: f32) {
        debug_assert!(size.is_finite() && size > 0.0, "degenerate cell size {size}");
        self.size = size;
        self.radius = size * size;
        self.mass = self.radius / MASS_DIVISOR;
    }

    /// Age in ticks.
    #[inline]
    pub fn age(&self, current_tick: u64) -> u64 {
        current_tick.saturating_sub(self.tick_of_birth)
    }

    /// Bounding box as stored in the spatial index.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_center(self.position, self.size)
    }

    /// Grow by another cell's radius.
    #[inline]
    pub fn absorb(&mut self, other_radius: f32) {
        self.set_size((self.radius + other_radius).sqrt());
    }

    /// Launch the cell along `angle`.
    #[inline]
    pub fn set_boost(&mut self, distance: f32, angle: f32) {
        self.boost = Some(Boost::from_angle(distance, angle));
    }

    #[inline]
    pub fn boost_distance(&self) -> f32 {
        self.boost.map_or(0.0, |b| b.distance)
    }

    /// Keep the cell inside the border, reflecting its boost off the wall it
    /// hits.
    pub fn check_border(&mut self, border: &Bounds) {
        let r = self.size / 2.0;
        let (min_x, max_x) = (border.min_x + r, border.max_x - r);
        let (min_y, max_y) = (border.min_y + r, border.max_y - r);

        if self.position.x < min_x || self.position.x > max_x {
            if let Some(boost) = self.boost.as_mut() {
                boost.direction.x = -boost.direction.x;
            }
            self.position.x = self.position.x.max(min_x).min(max_x);
        }
        if self.position.y < min_y || self.position.y > max_y {
            if let Some(boost) = self.boost.as_mut() {
                boost.direction.y = -boost.direction.y;
            }
            self.position.y = self.position.y.max(min_y).min(max_y);
        }
    }

    /// Advance the boost by one tick. Returns true while still boosting.
    pub fn update_boost(&mut self, border: &Bounds) -> bool {
        let Some(boost) = self.boost.as_mut() else {
            return false;
        };
        if boost.is_settled() {
            self.boost = None;
            return false;
        }

        let speed = boost.step();
        self.position += boost.direction * speed;
        self.check_border(border);
        true
    }
}

/// Trait for all cell types.
pub trait Cell {
    /// Get the common cell data.
    fn data(&self) -> &CellData;

    /// Get mutable cell data.
    fn data_mut(&mut self) -> &mut CellData;

    /// Protocol cell type.
    fn kind(&self) -> CellKind;

    /// Whether this cell may eat a cell of kind `prey`. `virus_room` is true
    /// while the world is below its virus cap.
    fn can_eat(&self, _prey: CellKind, _virus_room: bool) -> bool {
        false
    }
}
