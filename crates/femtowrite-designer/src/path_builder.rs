//! Incremental path assembly.
//!
//! [`PathBuilder`] chains segment generators, tracking the current position
//! and heading. It is the engine behind every primitive builder.

use crate::segments::{
    circular_arc, hermite_spline, line, sine_arc, PathSegment, Sampling, SegmentKind,
    SineOffsets,
};
use femtowrite_core::constants::{CONTINUITY_TOLERANCE, EPSILON};
use femtowrite_core::{BuildError, GeometryError, Point3};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderState {
    Unstarted,
    Building,
    Finalized,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderState::Unstarted => write!(f, "unstarted"),
            BuilderState::Building => write!(f, "building"),
            BuilderState::Finalized => write!(f, "finalized"),
        }
    }
}

/// How a linear target is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinearMode {
    Absolute,
    Incremental,
}

/// Stateful assembler of path segments.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    state: BuilderState,
    start: Point3,
    position: Point3,
    heading: f64,
    segments: Vec<PathSegment>,
    spacing: Option<f64>,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            state: BuilderState::Unstarted,
            start: Point3::origin(),
            position: Point3::origin(),
            heading: 0.0,
            segments: Vec::new(),
            spacing: None,
        }
    }

    /// Uses a fixed sample spacing instead of deriving it from the speed.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Start point, once started.
    pub fn start_point(&self) -> Option<Point3> {
        match self.state {
            BuilderState::Unstarted => None,
            _ => Some(self.start),
        }
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Current heading in the xy plane (radians, 0 = +x).
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn require(&self, operation: &str, expected: BuilderState) -> Result<(), BuildError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BuildError::InvalidState {
                operation: operation.to_string(),
                state: self.state.to_string(),
            })
        }
    }

    fn sampling(&self, speed: f64) -> Result<Sampling, GeometryError> {
        match self.spacing {
            Some(spacing) => Sampling::with_spacing(spacing),
            None => Sampling::for_speed(speed),
        }
    }

    /// Records the start point and initial heading.
    pub fn start(&mut self, position: Point3, heading: f64) -> Result<&mut Self, BuildError> {
        self.require("start", BuilderState::Unstarted)?;
        if !position.is_finite() || !heading.is_finite() {
            return Err(GeometryError::degenerate(format!(
                "start position {} is not finite",
                position
            ))
            .into());
        }
        self.start = position;
        self.position = position;
        self.heading = heading;
        self.state = BuilderState::Building;
        Ok(self)
    }

    /// Straight move, writing or travelling depending on `laser_on`.
    pub fn linear(
        &mut self,
        target: Point3,
        mode: LinearMode,
        speed: f64,
        laser_on: bool,
    ) -> Result<&mut Self, BuildError> {
        self.require("linear", BuilderState::Building)?;
        let end = match mode {
            LinearMode::Absolute => target,
            LinearMode::Incremental => self.position + target,
        };
        let points = line(self.position, end, self.sampling(speed)?)?;
        let kind = if laser_on {
            SegmentKind::Line
        } else {
            SegmentKind::Travel
        };
        let planar = self.position.planar_distance_to(&end);
        if planar > EPSILON {
            self.heading = (end.y - self.position.y).atan2(end.x - self.position.x);
        }
        self.push(PathSegment::from_positions(kind, &points, speed, laser_on));
        Ok(self)
    }

    /// Circular arc tangent to the current heading.
    pub fn arc(&mut self, radius: f64, sweep: f64, speed: f64) -> Result<&mut Self, BuildError> {
        self.require("arc", BuilderState::Building)?;
        let arc = circular_arc(self.position, self.heading, radius, sweep, self.sampling(speed)?)?;
        self.heading = arc.end_heading;
        let kind = SegmentKind::Arc {
            center: arc.center,
            radius: arc.radius,
            direction: arc.direction,
            sweep,
        };
        self.push(PathSegment::from_positions(kind, &arc.points, speed, true));
        Ok(self)
    }

    /// Half-period sinusoidal offset along the current heading.
    pub fn sine(&mut self, offsets: SineOffsets, speed: f64) -> Result<&mut Self, BuildError> {
        self.require("sin_arc", BuilderState::Building)?;
        let points = sine_arc(self.position, self.heading, offsets, self.sampling(speed)?)?;
        self.push(PathSegment::from_positions(SegmentKind::Sine, &points, speed, true));
        Ok(self)
    }

    /// Smooth spline through `waypoints`, leaving and arriving along the
    /// current heading.
    pub fn spline(&mut self, waypoints: &[Point3], speed: f64) -> Result<&mut Self, BuildError> {
        self.require("bridge", BuilderState::Building)?;
        let mut controls = Vec::with_capacity(waypoints.len() + 1);
        controls.push(self.position);
        controls.extend_from_slice(waypoints);
        let direction = Vector3::new(self.heading.cos(), self.heading.sin(), 0.0);
        let points = hermite_spline(&controls, direction, direction, self.sampling(speed)?)?;
        self.push(PathSegment::from_positions(SegmentKind::Spline, &points, speed, true));
        Ok(self)
    }

    /// Appends an externally generated segment.
    ///
    /// A start gap up to [`CONTINUITY_TOLERANCE`] is snapped onto the current
    /// position; a larger gap fails with `Discontinuity`.
    pub fn append_segment(&mut self, mut segment: PathSegment) -> Result<&mut Self, BuildError> {
        self.require("append_segment", BuilderState::Building)?;
        let first = segment
            .points
            .first_mut()
            .ok_or_else(|| GeometryError::degenerate("segment has no points"))?;
        let gap = first.position.distance_to(&self.position);
        if gap > CONTINUITY_TOLERANCE {
            return Err(GeometryError::Discontinuity {
                gap,
                tolerance: CONTINUITY_TOLERANCE,
            }
            .into());
        }
        first.position = self.position;

        let n = segment.points.len();
        if n >= 2 {
            let a = segment.points[n - 2].position;
            let b = segment.points[n - 1].position;
            if a.planar_distance_to(&b) > EPSILON {
                self.heading = (b.y - a.y).atan2(b.x - a.x);
            }
        }
        self.push(segment);
        Ok(self)
    }

    fn push(&mut self, segment: PathSegment) {
        if let Some(last) = segment.last() {
            self.position = last.position;
        }
        self.segments.push(segment);
    }

    /// Closes the path and hands over its segments.
    ///
    /// With `return_speed`, a closed-shutter travel back to the start point is
    /// appended first so the path can be scanned again.
    pub fn finish(&mut self, return_speed: Option<f64>) -> Result<Vec<PathSegment>, BuildError> {
        self.require("end", BuilderState::Building)?;
        if self.segments.is_empty() {
            return Err(GeometryError::degenerate("path has no segments").into());
        }
        if let Some(speed) = return_speed {
            if self.position.distance_to(&self.start) > CONTINUITY_TOLERANCE {
                let start = self.start;
                self.linear(start, LinearMode::Absolute, speed, false)?;
            }
        }
        self.state = BuilderState::Finalized;
        Ok(std::mem::take(&mut self.segments))
    }
}
