//! Trench builder.
//!
//! A trench is a rectangular block ablated by writing a serpentine floor and
//! then stacking wall outlines plane by plane up to the requested height.

use crate::path_builder::{LinearMode, PathBuilder};
use crate::primitive::{Primitive, PrimitiveKind, ScanSettings};
use femtowrite_core::constants::EPSILON;
use femtowrite_core::{BuildError, GeometryError, Point3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrenchParameters {
    pub scan: u32,
    /// Writing speed (mm/s)
    pub speed: f64,
    /// Shutter-closed travel speed (mm/s)
    pub speed_closed: f64,
    /// Block extent along x (mm)
    pub length: f64,
    /// Block extent along y (mm)
    pub width: f64,
    /// Wall extent along z (mm)
    pub height: f64,
    /// z of the floor (mm)
    pub depth: f64,
    /// z distance between stacked wall outlines (mm)
    pub wall_step: f64,
    /// y distance between floor raster lines (mm)
    pub floor_pitch: f64,
    pub point_spacing: Option<f64>,
}

impl Default for TrenchParameters {
    fn default() -> Self {
        Self {
            scan: 1,
            speed: 4.0,
            speed_closed: 5.0,
            length: 1.0,
            width: 0.1,
            height: 0.075,
            depth: 0.0,
            wall_step: 0.0015,
            floor_pitch: 0.005,
            point_spacing: None,
        }
    }
}

impl TrenchParameters {
    /// Number of wall outlines, the bottom one included.
    pub fn wall_planes(&self) -> usize {
        (self.height / self.wall_step - EPSILON).ceil().max(0.0) as usize + 1
    }

    /// Number of floor raster lines.
    pub fn floor_lines(&self) -> usize {
        (self.width / self.floor_pitch - EPSILON).ceil().max(0.0) as usize + 1
    }

    fn validate(&self) -> Result<(), GeometryError> {
        let positive = [
            ("length", self.length),
            ("width", self.width),
            ("wall_step", self.wall_step),
            ("floor_pitch", self.floor_pitch),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= EPSILON {
                return Err(GeometryError::degenerate(format!(
                    "trench {} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(GeometryError::degenerate(format!(
                "trench height must not be negative, got {}",
                self.height
            )));
        }
        Ok(())
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            scan: self.scan,
            speed: self.speed,
            speed_closed: self.speed_closed,
            depth: self.depth,
        }
    }
}

/// Builder for a rectangular trench.
#[derive(Debug, Clone)]
pub struct Trench {
    id: String,
    params: TrenchParameters,
    path: PathBuilder,
}

impl Trench {
    pub fn new(params: TrenchParameters) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), params)
    }

    pub fn with_id(id: impl Into<String>, params: TrenchParameters) -> Self {
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

    fn write_to(&mut self, target: Point3) -> Result<(), BuildError> {
        self.path
            .linear(target, LinearMode::Absolute, self.params.speed, true)?;
        Ok(())
    }

    /// Block with its lower-left corner at `(x, y)`.
    pub fn block(mut self, x: f64, y: f64) -> Result<Primitive, BuildError> {
        self.params.validate()?;
        let p = self.params.clone();
        let (x1, y1) = (x + p.length, y + p.width);

        self.path.start(Point3::new(x, y, p.depth), 0.0)?;

        // Floor raster, alternating direction
        let lines = p.floor_lines();
        for i in 0..lines {
            let yi = (y + i as f64 * p.floor_pitch).min(y1);
            if i > 0 {
                let xi = self.path.position().x;
                self.write_to(Point3::new(xi, yi, p.depth))?;
            }
            let xe = if i % 2 == 0 { x1 } else { x };
            self.write_to(Point3::new(xe, yi, p.depth))?;
        }
        self.path.linear(
            Point3::new(x, y, p.depth),
            LinearMode::Absolute,
            p.speed_closed,
            false,
        )?;

        // Wall outlines, bottom up
        let planes = p.wall_planes();
        for k in 0..planes {
            let z = (p.depth + k as f64 * p.wall_step).min(p.depth + p.height);
            if k > 0 {
                self.write_to(Point3::new(x, y, z))?;
            }
            self.write_to(Point3::new(x1, y, z))?;
            self.write_to(Point3::new(x1, y1, z))?;
            self.write_to(Point3::new(x, y1, z))?;
            self.write_to(Point3::new(x, y, z))?;
        }

        let segments = self.path.finish(Some(p.speed_closed))?;
        Ok(Primitive::new(
            self.id,
            PrimitiveKind::Trench,
            p.scan_settings(),
            segments,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TrenchParameters {
        TrenchParameters {
            length: 1.0,
            width: 0.02,
            height: 0.006,
            wall_step: 0.002,
            floor_pitch: 0.005,
            point_spacing: Some(0.1),
            ..Default::default()
        }
    }

    #[test]
    fn test_plane_and_line_counts() {
        let p = params();
        assert_eq!(p.wall_planes(), 4);
        assert_eq!(p.floor_lines(), 5);
    }

    #[test]
    fn test_block_geometry() {
        let p = Trench::with_id("t", params()).block(10.0, 5.0).unwrap();
        assert_eq!(p.kind(), PrimitiveKind::Trench);
        let bb = p.bounding_box().unwrap();
        assert!(bb.min.approx_eq(&Point3::new(10.0, 5.0, 0.0), 1e-12));
        assert!(bb.max.approx_eq(&Point3::new(11.0, 5.02, 0.006), 1e-12));
        assert_eq!(p.end_point(), Some(Point3::new(10.0, 5.0, 0.0)));

        // 5 floor lines + 4 floor steps, 4 outlines + 3 z steps
        let floor = 5.0 * 1.0 + 0.02;
        let walls = 4.0 * 2.04 + 0.006;
        assert!((p.writing_length() - (floor + walls)).abs() < 1e-9);
    }

    #[test]
    fn test_block_rejects_bad_parameters() {
        let bad = TrenchParameters {
            floor_pitch: 0.0,
            ..params()
        };
        assert!(Trench::new(bad).block(0.0, 0.0).is_err());
    }
}
