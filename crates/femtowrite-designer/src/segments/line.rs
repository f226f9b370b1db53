use super::{check_finite, Sampling};
use femtowrite_core::constants::{EPSILON, MIN_LINE_POINTS};
use femtowrite_core::{GeometryError, Point3};

/// Samples the straight segment from `start` to `end`.
///
/// The first sample is `start` and the last one is exactly `end`.
pub fn line(start: Point3, end: Point3, sampling: Sampling) -> Result<Vec<Point3>, GeometryError> {
    check_finite(&[start.x, start.y, start.z, end.x, end.y, end.z], "line")?;
    let length = start.distance_to(&end);
    if length <= EPSILON {
        return Err(GeometryError::degenerate(format!(
            "line from {} to {} has non-positive length",
            start, end
        )));
    }

    let n = sampling.intervals(length, MIN_LINE_POINTS)?;
    let mut points: Vec<Point3> = (0..n)
        .map(|i| start.lerp(&end, i as f64 / n as f64))
        .collect();
    points.push(end);
    Ok(points)
}
