//! Waveguide builder.
//!
//! Chains straight sections, bends, couplers and interferometer arms into a
//! single laser path. Every chain method is only valid between `start` and
//! `end`; calling it at another time fails with `InvalidState`.
//!
//! ```rust,ignore
//! let mut wg = Waveguide::new(params);
//! wg.start(Point3::new(-2.0, 0.0, 0.035))?
//!     .linear([5.0, 0.0, 0.0])?
//!     .arc_mzi(0.0365)?
//!     .linear_to([27.0, 0.0, 0.035])?;
//! let primitive = wg.end()?;
//! ```

use crate::path_builder::{BuilderState, LinearMode, PathBuilder};
use crate::primitive::{Primitive, PrimitiveKind, ScanSettings};
use crate::segments::SineOffsets;
use femtowrite_core::constants::EPSILON;
use femtowrite_core::{BuildError, GeometryError, Point3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geometric and fabrication parameters of a waveguide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveguideParameters {
    /// Number of passes
    pub scan: u32,
    /// Writing speed (mm/s)
    pub speed: f64,
    /// Shutter-closed travel speed (mm/s)
    pub speed_closed: f64,
    /// Bend radius (mm)
    pub radius: f64,
    /// Distance between neighbouring waveguides (mm)
    pub pitch: f64,
    /// Distance between waveguides in a coupler's interaction region (mm)
    pub int_dist: f64,
    /// Length of a coupler's interaction region (mm)
    pub int_length: f64,
    /// Length of an interferometer arm (mm)
    pub arm_length: f64,
    /// Writing depth (mm)
    pub depth: f64,
    /// Fixed sample spacing (mm); derived from the speed when unset
    pub point_spacing: Option<f64>,
}

impl Default for WaveguideParameters {
    fn default() -> Self {
        Self {
            scan: 1,
            speed: 20.0,
            speed_closed: 5.0,
            radius: 15.0,
            pitch: 0.080,
            int_dist: 0.007,
            int_length: 0.0,
            arm_length: 0.0,
            depth: 0.035,
            point_spacing: None,
        }
    }
}

impl WaveguideParameters {
    /// Lateral offset of one coupler bend, bringing two waveguides from
    /// `pitch` to `int_dist`.
    pub fn dy_bend(&self) -> f64 {
        0.5 * (self.pitch - self.int_dist)
    }

    /// Sweep angle of each arc of a two-arc S-bend with lateral offset `dy`.
    pub fn bend_angle(&self, dy: f64) -> Result<f64, GeometryError> {
        if self.radius <= EPSILON {
            return Err(GeometryError::degenerate(format!(
                "bend radius must be positive, got {}",
                self.radius
            )));
        }
        let cos_a = 1.0 - dy.abs() / (2.0 * self.radius);
        if cos_a < -1.0 {
            return Err(GeometryError::degenerate(format!(
                "offset {} is too large for radius {}",
                dy, self.radius
            )));
        }
        Ok(cos_a.acos())
    }

    /// Longitudinal length of an S-bend with lateral offset `dy`.
    pub fn bend_length(&self, dy: f64) -> Result<f64, GeometryError> {
        Ok(2.0 * self.radius * self.bend_angle(dy)?.sin())
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

/// Builder for a single waveguide.
#[derive(Debug, Clone)]
pub struct Waveguide {
    id: String,
    params: WaveguideParameters,
    path: PathBuilder,
}

impl Waveguide {
    /// Creates an unstarted waveguide with a random identifier.
    pub fn new(params: WaveguideParameters) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), params)
    }

    pub fn with_id(id: impl Into<String>, params: WaveguideParameters) -> Self {
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

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &WaveguideParameters {
        &self.params
    }

    pub fn state(&self) -> BuilderState {
        self.path.state()
    }

    pub fn position(&self) -> Point3 {
        self.path.position()
    }

    /// Starts the waveguide at `position`, heading along +x.
    pub fn start(&mut self, position: impl Into<Point3>) -> Result<&mut Self, BuildError> {
        self.path.start(position.into(), 0.0)?;
        Ok(self)
    }

    /// Straight writing move by an increment.
    pub fn linear(&mut self, increment: impl Into<Point3>) -> Result<&mut Self, BuildError> {
        self.path
            .linear(increment.into(), LinearMode::Incremental, self.params.speed, true)?;
        Ok(self)
    }

    /// Straight writing move to an absolute target.
    pub fn linear_to(&mut self, target: impl Into<Point3>) -> Result<&mut Self, BuildError> {
        self.path
            .linear(target.into(), LinearMode::Absolute, self.params.speed, true)?;
        Ok(self)
    }

    /// Shutter-closed move by an increment.
    pub fn travel(&mut self, increment: impl Into<Point3>) -> Result<&mut Self, BuildError> {
        self.path.linear(
            increment.into(),
            LinearMode::Incremental,
            self.params.speed_closed,
            false,
        )?;
        Ok(self)
    }

    /// Circular arc; a positive radius turns left.
    pub fn arc(&mut self, radius: f64, angle: f64) -> Result<&mut Self, BuildError> {
        self.path.arc(radius, angle, self.params.speed)?;
        Ok(self)
    }

    /// Sinusoidal lateral offset `dy` over a span `dx`.
    pub fn sin_arc(&mut self, dx: f64, dy: f64) -> Result<&mut Self, BuildError> {
        self.path
            .sine(SineOffsets::new(dx, dy, 0.0), self.params.speed)?;
        Ok(self)
    }

    /// Sinusoidal S-bend as long as the two-arc bend of the same offset.
    pub fn sin_bend(&mut self, dy: f64) -> Result<&mut Self, BuildError> {
        let dx = self.params.bend_length(dy)?;
        self.sin_arc(dx, dy)
    }

    /// S-bend made of two opposite circular arcs.
    pub fn arc_bend(&mut self, dy: f64) -> Result<&mut Self, BuildError> {
        let angle = self.params.bend_angle(dy)?;
        let radius = self.params.radius.copysign(dy);
        self.arc(radius, angle)?.arc(-radius, angle)
    }

    fn interaction(&mut self) -> Result<&mut Self, BuildError> {
        if self.params.int_length > 0.0 {
            self.linear([self.params.int_length, 0.0, 0.0])?;
        }
        Ok(self)
    }

    /// Directional coupler half: sinusoidal bend in, interaction region,
    /// bend back out.
    pub fn coupler(&mut self, dy: f64) -> Result<&mut Self, BuildError> {
        self.sin_bend(dy)?.interaction()?.sin_bend(-dy)
    }

    /// Directional coupler with circular bends.
    pub fn arc_coupler(&mut self, dy: f64) -> Result<&mut Self, BuildError> {
        self.arc_bend(dy)?.interaction()?.arc_bend(-dy)
    }

    /// Symmetric Mach-Zehnder arm: coupler, straight arm, coupler, all with
    /// sinusoidal bends.
    pub fn arc_mzi(&mut self, dy: f64) -> Result<&mut Self, BuildError> {
        self.coupler(dy)?;
        if self.params.arm_length > 0.0 {
            self.linear([self.params.arm_length, 0.0, 0.0])?;
        }
        self.coupler(dy)
    }

    /// Smooth 3D detour spanning `dx` with lateral offset `dy`, passing
    /// `dz` above or below the straight path at its midpoint.
    pub fn bridge(&mut self, dx: f64, dy: f64, dz: f64) -> Result<&mut Self, BuildError> {
        if dx <= EPSILON {
            return Err(GeometryError::degenerate(format!(
                "bridge span must be positive, got {}",
                dx
            ))
            .into());
        }
        let p = self.path.position();
        let h = self.path.heading();
        let (c, s) = (h.cos(), h.sin());
        let local = |u: f64, v: f64, w: f64| {
            Point3::new(p.x + u * c - v * s, p.y + u * s + v * c, p.z + w)
        };
        let waypoints = [local(dx / 2.0, dy / 2.0, dz), local(dx, dy, 0.0)];
        self.path.spline(&waypoints, self.params.speed)?;
        Ok(self)
    }

    /// Freezes the waveguide, adding the closed-shutter return to its start.
    pub fn end(mut self) -> Result<Primitive, BuildError> {
        let segments = self.path.finish(Some(self.params.speed_closed))?;
        Ok(Primitive::new(
            self.id,
            PrimitiveKind::Waveguide,
            self.params.scan_settings(),
            segments,
        ))
    }
}
