//! Geometry primitives shared by the spatial index and the physics code.
//!
//! Vectors are `glam::Vec2`; this module adds the axis-aligned box type
//! and the few angle helpers the Ogar physics needs.

use glam::Vec2;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Create bounds from center and half-extent (a cell's size).
    #[inline]
    pub fn from_center(center: Vec2, size: f32) -> Self {
        Self {
            min_x: center.x - size,
            min_y: center.y - size,
            max_x: center.x + size,
            max_y: center.y + size,
        }
    }

    /// Check if two bounds overlap. Touching edges do not count.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min_x >= self.max_x
            || other.max_x <= self.min_x
            || other.min_y >= self.max_y
            || other.max_y <= self.min_y)
    }

    /// Check if `other` lies entirely inside these bounds (edges inclusive).
    #[inline]
    pub fn contains(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Split into four equal quadrants: top-left, top-right, bottom-left,
    /// bottom-right (y grows downward, as in the Ogar coordinate system).
    pub fn quadrants(&self) -> [Bounds; 4] {
        let c = self.center();
        [
            Bounds::new(self.min_x, self.min_y, c.x, c.y),
            Bounds::new(c.x, self.min_y, self.max_x, c.y),
            Bounds::new(self.min_x, c.y, c.x, self.max_y),
            Bounds::new(c.x, c.y, self.max_x, self.max_y),
        ]
    }
}

/// Unit vector for an angle in radians, measured from +x toward +y.
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle in radians of a vector, inverse of [`direction_from_angle`].
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, 5.0, 15.0, 15.0);
        let c = Bounds::new(20.0, 20.0, 30.0, 30.0);
        let touching = Bounds::new(10.0, 0.0, 20.0, 10.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_quadrants_cover_parent() {
        let b = Bounds::new(-100.0, -50.0, 100.0, 50.0);
        let q = b.quadrants();
        assert_eq!(q[0], Bounds::new(-100.0, -50.0, 0.0, 0.0));
        assert_eq!(q[3], Bounds::new(0.0, 0.0, 100.0, 50.0));
        for quad in &q {
            assert!(b.contains(quad));
            assert_eq!(quad.width(), 100.0);
            assert_eq!(quad.height(), 50.0);
        }
    }

    #[test]
    fn test_angle_round_trip() {
        let angle = 1.2_f32;
        let dir = direction_from_angle(angle);
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!((angle_of(dir) - angle).abs() < 1e-6);
    }
}
