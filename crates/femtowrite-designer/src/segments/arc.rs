use super::{check_finite, ArcDirection, Sampling};
use femtowrite_core::constants::{EPSILON, MIN_CURVE_POINTS};
use femtowrite_core::{GeometryError, Point3};
use std::f64::consts::FRAC_PI_2;

/// Samples of a circular arc plus the data needed to chain and emit it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcSamples {
    pub points: Vec<Point3>,
    pub center: Point3,
    /// Unsigned radius
    pub radius: f64,
    pub direction: ArcDirection,
    /// Heading at the last sample (radians)
    pub end_heading: f64,
}

/// Samples a circular arc in the xy plane.
///
/// The arc leaves `start` tangent to `heading`. A positive `radius` turns
/// left (counter-clockwise), a negative one turns right. `sweep` is the
/// unsigned swept angle in radians. z stays at `start.z`.
pub fn circular_arc(
    start: Point3,
    heading: f64,
    radius: f64,
    sweep: f64,
    sampling: Sampling,
) -> Result<ArcSamples, GeometryError> {
    check_finite(&[start.x, start.y, start.z, heading, radius, sweep], "arc")?;
    if sweep <= EPSILON {
        return Err(GeometryError::degenerate(format!(
            "arc sweep must be positive, got {}",
            sweep
        )));
    }
    if radius.abs() <= EPSILON {
        return Err(GeometryError::degenerate(format!(
            "arc with zero radius and sweep {}",
            sweep
        )));
    }

    let direction = ArcDirection::from_radius(radius);
    let r = radius.abs();
    // Orientation of the start point seen from the center
    let (sign, phi0) = match direction {
        ArcDirection::CounterClockwise => (1.0, heading - FRAC_PI_2),
        ArcDirection::Clockwise => (-1.0, heading + FRAC_PI_2),
    };
    let center = Point3::new(start.x - r * phi0.cos(), start.y - r * phi0.sin(), start.z);

    let n = sampling.intervals(r * sweep, MIN_CURVE_POINTS)?;
    let mut points = Vec::with_capacity(n + 1);
    points.push(start);
    for i in 1..=n {
        let phi = phi0 + sign * sweep * i as f64 / n as f64;
        points.push(Point3::new(
            center.x + r * phi.cos(),
            center.y + r * phi.sin(),
            start.z,
        ));
    }

    Ok(ArcSamples {
        points,
        center,
        radius: r,
        direction,
        end_heading: heading + sign * sweep,
    })
}
