//! Segment generators.
//!
//! Pure functions producing ordered point sequences for the geometric units a
//! laser path is made of. Every generator starts exactly at the given start
//! point, so chained segments are continuous by construction.

mod arc;
mod line;
mod sine;
mod spline;

pub use arc::{circular_arc, ArcSamples};
pub use line::line;
pub use sine::{sine_arc, SineOffsets};
pub use spline::hermite_spline;

use femtowrite_core::constants::{CMD_RATE_MAX, EPSILON, MAX_SEGMENT_POINTS};
use femtowrite_core::{GeometryError, PathPoint, Point3};
use serde::{Deserialize, Serialize};

/// Rotation sense of an arc seen from +z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

impl ArcDirection {
    /// Direction for a signed radius (positive turns left).
    pub fn from_radius(radius: f64) -> Self {
        if radius < 0.0 {
            ArcDirection::Clockwise
        } else {
            ArcDirection::CounterClockwise
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            ArcDirection::Clockwise => ArcDirection::CounterClockwise,
            ArcDirection::CounterClockwise => ArcDirection::Clockwise,
        }
    }
}

/// Geometric kind of a path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Straight writing segment
    Line,
    /// Circular arc in the xy plane
    Arc {
        center: Point3,
        radius: f64,
        direction: ArcDirection,
        /// Unsigned swept angle (radians), may exceed a full turn
        sweep: f64,
    },
    /// Half-period sinusoidal offset
    Sine,
    /// Cubic Hermite spline
    Spline,
    /// Closed-shutter repositioning move
    Travel,
}

impl SegmentKind {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentKind::Line => "line",
            SegmentKind::Arc { .. } => "arc",
            SegmentKind::Sine => "sine",
            SegmentKind::Spline => "spline",
            SegmentKind::Travel => "travel",
        }
    }
}

/// A sampled geometric unit of a laser path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub kind: SegmentKind,
    pub points: Vec<PathPoint>,
}

impl PathSegment {
    pub fn new(kind: SegmentKind, points: Vec<PathPoint>) -> Self {
        Self { kind, points }
    }

    /// Tags every sample with the same feed rate and laser state.
    pub fn from_positions(
        kind: SegmentKind,
        positions: &[Point3],
        feed_rate: f64,
        laser_on: bool,
    ) -> Self {
        let points = positions
            .iter()
            .map(|&position| PathPoint {
                position,
                feed_rate,
                laser_on,
            })
            .collect();
        Self { kind, points }
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Polyline length of the samples.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].position.distance_to(&w[1].position))
            .sum()
    }

    /// Whether the laser writes along this segment.
    pub fn is_writing(&self) -> bool {
        self.points.iter().skip(1).any(|p| p.laser_on)
    }
}

/// Sample spacing along a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    /// Distance between consecutive samples (mm)
    pub spacing: f64,
}

impl Sampling {
    /// Explicit spacing in mm.
    pub fn with_spacing(spacing: f64) -> Result<Self, GeometryError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(GeometryError::degenerate(format!(
                "sample spacing must be positive, got {}",
                spacing
            )));
        }
        Ok(Self { spacing })
    }

    /// Spacing matching the controller command rate at `speed` mm/s.
    pub fn for_speed(speed: f64) -> Result<Self, GeometryError> {
        Self::with_spacing(speed / CMD_RATE_MAX)
    }

    /// Number of intervals for a segment of `length`, with at least
    /// `min_points` samples in total.
    ///
    /// Fails when more than [`MAX_SEGMENT_POINTS`] samples would be needed.
    pub fn intervals(&self, length: f64, min_points: usize) -> Result<usize, GeometryError> {
        let n = (length / self.spacing - EPSILON).ceil().max(1.0);
        if !n.is_finite() || n >= MAX_SEGMENT_POINTS as f64 {
            return Err(GeometryError::degenerate(format!(
                "segment of length {} at spacing {} needs more than {} points",
                length, self.spacing, MAX_SEGMENT_POINTS
            )));
        }
        Ok((n as usize).max(min_points.saturating_sub(1)).max(1))
    }
}

pub(crate) fn check_finite(values: &[f64], what: &str) -> Result<(), GeometryError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::degenerate(format!(
            "{} has non-finite input",
            what
        )))
    }
}

/// Unit direction in the xy plane for a heading angle.
pub(crate) fn heading_vector(heading: f64) -> (f64, f64) {
    (heading.cos(), heading.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_intervals() {
        let s = Sampling::with_spacing(0.5).unwrap();
        assert_eq!(s.intervals(10.0, 2).unwrap(), 20);
        assert_eq!(s.intervals(10.1, 2).unwrap(), 21);
        assert_eq!(s.intervals(0.1, 2).unwrap(), 1);
        assert_eq!(s.intervals(0.1, 10).unwrap(), 9);
    }

    #[test]
    fn test_sampling_caps_point_count() {
        let s = Sampling::with_spacing(1e-9).unwrap();
        let err = s.intervals(1e6, 2).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateGeometry { .. }));
        assert!(err.to_string().contains("points"));
        assert!(s.intervals(f64::INFINITY, 2).is_err());
    }

    #[test]
    fn test_sampling_rejects_bad_spacing() {
        assert!(Sampling::with_spacing(0.0).is_err());
        assert!(Sampling::with_spacing(f64::NAN).is_err());
        assert!(Sampling::for_speed(-1.0).is_err());
    }

    #[test]
    fn test_segment_length_and_writing() {
        let seg = PathSegment::from_positions(
            SegmentKind::Line,
            &[Point3::origin(), Point3::new(3.0, 4.0, 0.0)],
            20.0,
            true,
        );
        assert_eq!(seg.length(), 5.0);
        assert!(seg.is_writing());

        let travel = PathSegment::from_positions(
            SegmentKind::Travel,
            &[Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            5.0,
            false,
        );
        assert!(!travel.is_writing());
    }

    #[test]
    fn test_arc_direction_from_radius() {
        assert_eq!(ArcDirection::from_radius(15.0), ArcDirection::CounterClockwise);
        assert_eq!(ArcDirection::from_radius(-15.0), ArcDirection::Clockwise);
        assert_eq!(
            ArcDirection::Clockwise.reversed(),
            ArcDirection::CounterClockwise
        );
    }
}
