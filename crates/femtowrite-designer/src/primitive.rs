//! Finalized primitives.
//!
//! A [`Primitive`] is the frozen output of a builder: ordered path segments
//! plus the metadata the compiler needs (scan count, speeds, depth). The type
//! can only be obtained from a builder's `end`, so every primitive is
//! finalized and immutable.

use crate::segments::PathSegment;
use femtowrite_core::{PathPoint, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The family a primitive belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Waveguide,
    Trench,
    Marker,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Waveguide => write!(f, "waveguide"),
            PrimitiveKind::Trench => write!(f, "trench"),
            PrimitiveKind::Marker => write!(f, "marker"),
        }
    }
}

/// Fabrication settings shared by every primitive family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Number of passes over the full path
    pub scan: u32,
    /// Writing speed (mm/s)
    pub speed: f64,
    /// Shutter-closed travel speed (mm/s)
    pub speed_closed: f64,
    /// Nominal writing depth (mm)
    pub depth: f64,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            BoundingBox {
                min: first,
                max: first,
            },
            |bb, p| bb.including(p),
        ))
    }

    fn including(self, p: &Point3) -> Self {
        BoundingBox {
            min: Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            max: Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        }
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        self.including(&other.min).including(&other.max)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// A finalized optical primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    id: String,
    kind: PrimitiveKind,
    settings: ScanSettings,
    segments: Vec<PathSegment>,
}

impl Primitive {
    pub(crate) fn new(
        id: String,
        kind: PrimitiveKind,
        settings: ScanSettings,
        segments: Vec<PathSegment>,
    ) -> Self {
        Self {
            id,
            kind,
            settings,
            segments,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn scan(&self) -> u32 {
        self.settings.scan
    }

    pub fn speed(&self) -> f64 {
        self.settings.speed
    }

    pub fn speed_closed(&self) -> f64 {
        self.settings.speed_closed
    }

    pub fn depth(&self) -> f64 {
        self.settings.depth
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// All samples in path order. The shared boundary sample between two
    /// segments is yielded once.
    pub fn points(&self) -> impl Iterator<Item = &PathPoint> + '_ {
        self.segments.iter().enumerate().flat_map(|(i, seg)| {
            let skip = usize::from(i > 0);
            seg.points.iter().skip(skip)
        })
    }

    pub fn path_points(&self) -> Vec<PathPoint> {
        self.points().copied().collect()
    }

    pub fn start_point(&self) -> Option<Point3> {
        self.points().next().map(|p| p.position)
    }

    pub fn end_point(&self) -> Option<Point3> {
        self.segments
            .last()
            .and_then(|s| s.last())
            .map(|p| p.position)
    }

    /// Last point reached with the laser on.
    pub fn last_written_point(&self) -> Option<Point3> {
        self.segments
            .iter()
            .rev()
            .find(|s| s.is_writing())
            .and_then(|s| s.last())
            .map(|p| p.position)
    }

    /// Total path length of one pass, travel included (mm).
    pub fn length(&self) -> f64 {
        self.segments.iter().map(PathSegment::length).sum()
    }

    /// Length written with the laser on, for one pass (mm).
    pub fn writing_length(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.is_writing())
            .map(PathSegment::length)
            .sum()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points().map(|p| &p.position))
    }

    /// Motion time for all passes, from per-sample feed rates (s).
    pub fn fabrication_time(&self) -> f64 {
        let pts = self.path_points();
        let one_pass: f64 = pts
            .windows(2)
            .filter(|w| w[1].feed_rate > 0.0)
            .map(|w| w[0].position.distance_to(&w[1].position) / w[1].feed_rate)
            .sum();
        one_pass * f64::from(self.settings.scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::SegmentKind;

    fn sample() -> Primitive {
        let write = PathSegment::from_positions(
            SegmentKind::Line,
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)],
            20.0,
            true,
        );
        let back = PathSegment::from_positions(
            SegmentKind::Travel,
            &[Point3::new(10.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)],
            5.0,
            false,
        );
        Primitive::new(
            "wg".to_string(),
            PrimitiveKind::Waveguide,
            ScanSettings {
                scan: 2,
                speed: 20.0,
                speed_closed: 5.0,
                depth: 0.0,
            },
            vec![write, back],
        )
    }

    #[test]
    fn test_points_skip_shared_boundaries() {
        let p = sample();
        assert_eq!(p.points().count(), 3);
        assert_eq!(p.start_point(), Some(Point3::origin()));
        assert_eq!(p.end_point(), Some(Point3::origin()));
        assert_eq!(p.last_written_point(), Some(Point3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_lengths_and_time() {
        let p = sample();
        assert_eq!(p.length(), 20.0);
        assert_eq!(p.writing_length(), 10.0);
        // (10 / 20 + 10 / 5) * 2 scans
        assert!((p.fabrication_time() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let bb = sample().bounding_box().unwrap();
        assert_eq!(bb.min, Point3::origin());
        assert_eq!(bb.max, Point3::new(10.0, 0.0, 0.0));
        assert_eq!(bb.width(), 10.0);
    }
}
