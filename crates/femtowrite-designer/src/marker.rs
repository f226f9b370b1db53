//! Alignment markers written at the sample surface.

use crate::path_builder::{LinearMode, PathBuilder};
use crate::primitive::{Primitive, PrimitiveKind, ScanSettings};
use femtowrite_core::{BuildError, GeometryError, Point3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerParameters {
    pub scan: u32,
    /// Writing speed (mm/s)
    pub speed: f64,
    /// Shutter-closed travel speed (mm/s)
    pub speed_closed: f64,
    /// Writing depth (mm)
    pub depth: f64,
    /// Cross arm length along x (mm)
    pub lx: f64,
    /// Cross arm length along y (mm)
    pub ly: f64,
    pub point_spacing: Option<f64>,
}

impl Default for MarkerParameters {
    fn default() -> Self {
        Self {
            scan: 1,
            speed: 1.0,
            speed_closed: 5.0,
            depth: 0.001,
            lx: 1.0,
            ly: 0.060,
            point_spacing: None,
        }
    }
}

impl MarkerParameters {
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            scan: self.scan,
            speed: self.speed,
            speed_closed: self.speed_closed,
            depth: self.depth,
        }
    }
}

/// Builder for marker primitives.
#[derive(Debug, Clone)]
pub struct Marker {
    id: String,
    params: MarkerParameters,
    path: PathBuilder,
}

impl Marker {
    pub fn new(params: MarkerParameters) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), params)
    }

    pub fn with_id(id: impl Into<String>, params: MarkerParameters) -> Self {
        let mut path = PathBuilder::new();
        if let Some(spacing) = params.point_spacing {
            path = path.with_spacing(spacing);
        }
        Self {
            id: id.into(),
            params,
            path,
        }
    }

    fn write(&mut self, increment: Point3) -> Result<(), BuildError> {
        self.path
            .linear(increment, LinearMode::Incremental, self.params.speed, true)?;
        Ok(())
    }

    fn travel(&mut self, target: Point3, mode: LinearMode) -> Result<(), BuildError> {
        self.path
            .linear(target, mode, self.params.speed_closed, false)?;
        Ok(())
    }

    fn finish(mut self) -> Result<Primitive, BuildError> {
        let segments = self.path.finish(Some(self.params.speed_closed))?;
        Ok(Primitive::new(
            self.id,
            PrimitiveKind::Marker,
            self.params.scan_settings(),
            segments,
        ))
    }

    /// Cross centered on `(x, y)` at the marker depth.
    pub fn cross(mut self, x: f64, y: f64) -> Result<Primitive, BuildError> {
        let (lx, ly) = (self.params.lx, self.params.ly);
        self.path
            .start(Point3::new(x, y, self.params.depth), 0.0)?;
        self.travel(Point3::new(-lx / 2.0, 0.0, 0.0), LinearMode::Incremental)?;
        self.write(Point3::new(lx, 0.0, 0.0))?;
        self.travel(Point3::new(-lx / 2.0, 0.0, 0.0), LinearMode::Incremental)?;
        self.travel(Point3::new(0.0, -ly / 2.0, 0.0), LinearMode::Incremental)?;
        self.write(Point3::new(0.0, ly, 0.0))?;
        self.travel(Point3::new(0.0, -ly / 2.0, 0.0), LinearMode::Incremental)?;
        self.finish()
    }

    /// Ruler of horizontal ticks starting at `x_init`, one per entry of
    /// `y_ticks`. The first tick is `lx` long, the others `lx_short`.
    pub fn ruler(
        mut self,
        y_ticks: &[f64],
        lx_short: f64,
        x_init: f64,
    ) -> Result<Primitive, BuildError> {
        let first = *y_ticks
            .first()
            .ok_or_else(|| GeometryError::degenerate("ruler needs at least one tick"))?;
        let z = self.params.depth;
        self.path.start(Point3::new(x_init, first, z), 0.0)?;
        for (i, &y) in y_ticks.iter().enumerate() {
            if i > 0 {
                self.travel(Point3::new(x_init, y, z), LinearMode::Absolute)?;
            }
            let length = if i == 0 { self.params.lx } else { lx_short };
            self.write(Point3::new(length, 0.0, 0.0))?;
            self.travel(Point3::new(x_init, y, z), LinearMode::Absolute)?;
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::SegmentKind;

    fn params() -> MarkerParameters {
        MarkerParameters {
            point_spacing: Some(0.01),
            ..Default::default()
        }
    }

    #[test]
    fn test_cross_layout() {
        let p = Marker::with_id("m", params()).cross(5.0, 5.0).unwrap();
        assert_eq!(p.kind(), PrimitiveKind::Marker);
        let kinds: Vec<_> = p.segments().iter().map(|s| s.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Travel,
                SegmentKind::Line,
                SegmentKind::Travel,
                SegmentKind::Travel,
                SegmentKind::Line,
                SegmentKind::Travel,
            ]
        );
        assert!((p.writing_length() - 1.06).abs() < 1e-12);
        assert!(p.end_point().unwrap().approx_eq(&Point3::new(5.0, 5.0, 0.001), 1e-12));
        let bb = p.bounding_box().unwrap();
        assert!((bb.width() - 1.0).abs() < 1e-12);
        assert!((bb.height() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_ruler_ticks() {
        let p = Marker::with_id("r", params())
            .ruler(&[0.0, 0.5, 1.0], 0.25, -2.0)
            .unwrap();
        assert!((p.writing_length() - 1.5).abs() < 1e-12);
        assert_eq!(p.start_point(), Some(Point3::new(-2.0, 0.0, 0.001)));
    }

    #[test]
    fn test_ruler_without_ticks_fails() {
        assert!(Marker::new(params()).ruler(&[], 0.25, -2.0).is_err());
    }
}
