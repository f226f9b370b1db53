//! Point types for path samples.
//!
//! [`Point3`] is a plain coordinate triple in millimeters. [`PathPoint`] tags a
//! coordinate with the feed rate used to reach it and whether the laser writes
//! while moving there.

use nalgebra::{Point3 as NPoint3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A 3D coordinate in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin `(0, 0, 0)`.
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point3) -> f64 {
        (*other - *self).norm()
    }

    /// Distance in the xy plane only.
    pub fn planar_distance_to(&self, other: &Point3) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Returns true if every coordinate is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Point3, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`.
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        Point3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    /// Length of the point seen as a vector from the origin.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Converts to a nalgebra point.
    pub fn to_na(&self) -> NPoint3<f64> {
        NPoint3::new(self.x, self.y, self.z)
    }

    /// Converts to a nalgebra vector.
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<NPoint3<f64>> for Point3 {
    fn from(p: NPoint3<f64>) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

impl From<Vector3<f64>> for Point3 {
    fn from(v: Vector3<f64>) -> Self {
        Point3::new(v.x, v.y, v.z)
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(v: [f64; 3]) -> Self {
        Point3::new(v[0], v[1], v[2])
    }
}

impl From<(f64, f64, f64)> for Point3 {
    fn from(v: (f64, f64, f64)) -> Self {
        Point3::new(v.0, v.1, v.2)
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

/// A sampled point of a laser path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Point3,
    /// Feed rate used to reach this point (mm/s)
    pub feed_rate: f64,
    /// Whether the laser writes while moving to this point
    pub laser_on: bool,
}

impl PathPoint {
    /// Creates a writing sample.
    pub fn writing(position: Point3, feed_rate: f64) -> Self {
        Self {
            position,
            feed_rate,
            laser_on: true,
        }
    }

    /// Creates a travel (shutter closed) sample.
    pub fn travel(position: Point3, feed_rate: f64) -> Self {
        Self {
            position,
            feed_rate,
            laser_on: false,
        }
    }

    /// Returns a copy at a different position, keeping feed and laser state.
    pub fn with_position(&self, position: Point3) -> Self {
        Self { position, ..*self }
    }
}
