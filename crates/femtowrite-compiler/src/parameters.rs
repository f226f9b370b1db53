//! Compilation parameters.

use crate::profile::LaserProfile;
use femtowrite_core::{CompileError, Point3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global settings of one compilation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerParameters {
    /// Program name; `.pgm` is appended when written
    pub filename: String,
    /// Directory for the written program, created on demand
    pub export_dir: Option<PathBuf>,
    pub laser: LaserProfile,
    pub n_glass: f64,
    pub n_environment: f64,
    /// Sample extent in x and y (mm)
    pub sample_size: (f64, f64),
    /// Point of the design frame mapped to the sample origin
    pub new_origin: (f64, f64),
    /// Software rotation of the layout (degrees)
    pub rotation_angle: f64,
    /// Hardware G84 rotation of the xy axes (degrees)
    pub aerotech_angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Pause after shutter toggles and positioning moves (s)
    pub long_pause: f64,
    /// Pause before shutter toggles and program calls (s)
    pub short_pause: f64,
    /// Decimal digits of printed coordinates and feeds
    pub output_digits: usize,
    /// Positioning speed (mm/s)
    pub speed_pos: f64,
    /// Position the machine returns to on close
    pub home_position: Point3,
    /// Emit G2/G3 for circular segments when the transform preserves circles
    pub native_arcs: bool,
    /// Compensate the measured sample surface
    pub warp_flag: bool,
    /// Tolerance around the sample outline for the bounds check (mm)
    pub bounds_margin: f64,
}

impl Default for CompilerParameters {
    fn default() -> Self {
        Self {
            filename: "program.pgm".to_string(),
            export_dir: None,
            laser: LaserProfile::Pharos,
            n_glass: 1.50,
            n_environment: 1.33,
            sample_size: (100.0, 50.0),
            new_origin: (0.0, 0.0),
            rotation_angle: 0.0,
            aerotech_angle: 0.0,
            flip_x: false,
            flip_y: false,
            long_pause: 0.5,
            short_pause: 0.05,
            output_digits: 6,
            speed_pos: 5.0,
            home_position: Point3::origin(),
            native_arcs: false,
            warp_flag: false,
            bounds_margin: 3.0,
        }
    }
}

impl CompilerParameters {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Effective refractive index `n_glass / n_environment`.
    pub fn neff(&self) -> f64 {
        self.n_glass / self.n_environment
    }

    pub fn x_sample(&self) -> f64 {
        self.sample_size.0.abs()
    }

    pub fn y_sample(&self) -> f64 {
        self.sample_size.1.abs()
    }

    /// Software rotation in radians, reduced to one turn.
    pub fn rotation_radians(&self) -> f64 {
        (self.rotation_angle % 360.0).to_radians()
    }

    /// G84 angle reduced to `0..360`, `None` when no hardware rotation is set.
    pub fn hardware_angle(&self) -> Option<f64> {
        let angle = self.aerotech_angle.rem_euclid(360.0);
        (angle != 0.0).then_some(angle)
    }

    /// Smallest feed that survives formatting with `output_digits`.
    pub fn min_feed(&self) -> f64 {
        10f64.powi(-(self.output_digits as i32))
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.filename.trim().is_empty() {
            return Err(CompileError::invalid("filename", "must not be empty"));
        }
        for (name, value) in [("n_glass", self.n_glass), ("n_environment", self.n_environment)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CompileError::invalid(name, format!("must be positive, got {}", value)));
            }
        }
        let (sx, sy) = self.sample_size;
        if !(sx.is_finite() && sy.is_finite()) || sx == 0.0 || sy == 0.0 {
            return Err(CompileError::invalid(
                "sample_size",
                format!("wrong sample size dimensions ({}, {})", sx, sy),
            ));
        }
        for (name, value) in [("long_pause", self.long_pause), ("short_pause", self.short_pause)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CompileError::invalid(name, format!("must be non-negative, got {}", value)));
            }
        }
        if self.speed_pos < self.min_feed() {
            return Err(CompileError::invalid("speed_pos", "positioning speed is zero"));
        }
        if self.output_digits > 12 {
            return Err(CompileError::invalid("output_digits", "at most 12 digits are supported"));
        }
        if !(self.bounds_margin.is_finite() && self.bounds_margin >= 0.0) {
            return Err(CompileError::invalid("bounds_margin", "must be non-negative"));
        }
        if !self.rotation_angle.is_finite() || !self.aerotech_angle.is_finite() {
            return Err(CompileError::invalid("rotation_angle", "must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = CompilerParameters::default();
        assert!((p.neff() - 1.5 / 1.33).abs() < 1e-12);
        assert_eq!(p.x_sample(), 100.0);
        assert_eq!(p.min_feed(), 1e-6);
        assert_eq!(p.hardware_angle(), None);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_angles_reduced() {
        let p = CompilerParameters {
            rotation_angle: 370.0,
            aerotech_angle: -90.0,
            ..Default::default()
        };
        assert!((p.rotation_radians() - 10f64.to_radians()).abs() < 1e-12);
        assert_eq!(p.hardware_angle(), Some(270.0));
    }

    #[test]
    fn test_validate_rejects() {
        let p = CompilerParameters {
            sample_size: (0.0, 50.0),
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = CompilerParameters {
            n_glass: -1.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        assert!(CompilerParameters::new("").validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let p: CompilerParameters =
            serde_json::from_str(r#"{"filename": "chip", "laser": "ANT"}"#).unwrap();
        assert_eq!(p.laser, LaserProfile::Ant);
        assert_eq!(p.short_pause, 0.05);
    }
}
