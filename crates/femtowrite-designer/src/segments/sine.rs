use super::{check_finite, heading_vector, Sampling};
use femtowrite_core::constants::{EPSILON, MIN_CURVE_POINTS};
use femtowrite_core::{GeometryError, Point3};
use std::f64::consts::PI;

/// Displacements of a sinusoidal arc, in the frame of the incoming heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineOffsets {
    /// Longitudinal span along the heading
    pub dx: f64,
    /// Lateral offset, positive to the left
    pub dy: f64,
    /// Vertical offset
    pub dz: f64,
}

impl SineOffsets {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    fn profile(&self, t: f64) -> (f64, f64, f64) {
        let s = 0.5 * (1.0 - (PI * t).cos());
        (self.dx * t, self.dy * s, self.dz * s)
    }

    /// Length of the curve, integrated on a fine polyline.
    fn approximate_length(&self) -> f64 {
        const STEPS: usize = 64;
        let mut length = 0.0;
        let mut prev = self.profile(0.0);
        for i in 1..=STEPS {
            let cur = self.profile(i as f64 / STEPS as f64);
            length += ((cur.0 - prev.0).powi(2) + (cur.1 - prev.1).powi(2) + (cur.2 - prev.2).powi(2))
                .sqrt();
            prev = cur;
        }
        length
    }
}

/// Samples a half-period cosine transition starting at `start`.
///
/// The lateral and vertical offsets follow `d/2 * (1 - cos(pi * t))`, so the
/// slope is zero at both ends and the heading is unchanged after the arc.
pub fn sine_arc(
    start: Point3,
    heading: f64,
    offsets: SineOffsets,
    sampling: Sampling,
) -> Result<Vec<Point3>, GeometryError> {
    check_finite(
        &[start.x, start.y, start.z, heading, offsets.dx, offsets.dy, offsets.dz],
        "sine arc",
    )?;
    if offsets.dx <= EPSILON {
        return Err(GeometryError::degenerate(format!(
            "sine arc span must be positive, got {}",
            offsets.dx
        )));
    }

    let (cos_h, sin_h) = heading_vector(heading);
    let n = sampling.intervals(offsets.approximate_length(), MIN_CURVE_POINTS)?;
    let points = (0..=n)
        .map(|i| {
            let (u, v, w) = offsets.profile(i as f64 / n as f64);
            Point3::new(
                start.x + u * cos_h - v * sin_h,
                start.y + u * sin_h + v * cos_h,
                start.z + w,
            )
        })
        .collect();
    Ok(points)
}
