//! Three-dimensional real-valued geometry.
//!
//! The engine works in a plain Euclidean space rather than geographic
//! coordinates: agent positions, box origins, and bounding boxes are all
//! `Point3<f64>` / `[f64; 3]` arithmetic, no haversine involved.

use std::fmt;
use std::ops::{Add, Index, Mul, Sub};

/// A point (or displacement vector) in three-dimensional real space.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance — the engine's hot-path distance check,
    /// since every radius comparison is against a squared radius.
    #[inline]
    pub fn distance_squared(self, other: Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    pub fn distance(self, other: Point3) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Componentwise minimum, used when folding a bounding box over agent positions.
    #[inline]
    pub fn min(self, other: Point3) -> Point3 {
        Point3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[inline]
    pub fn max(self, other: Point3) -> Point3 {
        Point3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl Add for Point3 {
    type Output = Point3;
    #[inline]
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    #[inline]
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;
    #[inline]
    fn mul(self, scalar: f64) -> Point3 {
        Point3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Index<usize> for Point3 {
    type Output = f64;
    fn index(&self, axis: usize) -> &f64 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Point3 has only 3 axes, got index {axis}"),
        }
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// An axis-aligned bounding box in grid-aligned integer coordinates: six
/// values, `[min_x, max_x, min_y, max_y, min_z, max_z]`, the shape the
/// uniform grid rounds a real-valued bounding box out to once it pads and
/// aligns it to box-edge multiples.
pub type GridBounds = [i64; 6];
