use super::{check_finite, Sampling};
use femtowrite_core::constants::{EPSILON, MIN_CURVE_POINTS};
use femtowrite_core::{GeometryError, Point3};
use nalgebra::Vector3;

/// Samples a cubic Hermite spline through `controls`.
///
/// `start_direction` and `end_direction` fix the tangent directions at the
/// two ends (they are normalized and scaled by the adjacent chord length).
/// Interior tangents use the Catmull-Rom rule. Each span gets its own sample
/// count from its chord length.
pub fn hermite_spline(
    controls: &[Point3],
    start_direction: Vector3<f64>,
    end_direction: Vector3<f64>,
    sampling: Sampling,
) -> Result<Vec<Point3>, GeometryError> {
    if controls.len() < 2 {
        return Err(GeometryError::degenerate(
            "spline needs at least two control points",
        ));
    }
    for p in controls {
        check_finite(&[p.x, p.y, p.z], "spline")?;
    }
    if controls
        .windows(2)
        .any(|w| w[0].distance_to(&w[1]) <= EPSILON)
    {
        return Err(GeometryError::degenerate(
            "spline has coincident control points",
        ));
    }
    let start_dir = start_direction
        .try_normalize(EPSILON)
        .ok_or_else(|| GeometryError::degenerate("spline start tangent is zero"))?;
    let end_dir = end_direction
        .try_normalize(EPSILON)
        .ok_or_else(|| GeometryError::degenerate("spline end tangent is zero"))?;

    let pts: Vec<Vector3<f64>> = controls.iter().map(Point3::to_vector).collect();
    let last = pts.len() - 1;
    let tangents: Vec<Vector3<f64>> = (0..=last)
        .map(|i| {
            if i == 0 {
                start_dir * (pts[1] - pts[0]).norm()
            } else if i == last {
                end_dir * (pts[last] - pts[last - 1]).norm()
            } else {
                (pts[i + 1] - pts[i - 1]) * 0.5
            }
        })
        .collect();

    let spans = last as f64;
    let min_per_span = (MIN_CURVE_POINTS as f64 / spans).ceil() as usize + 1;
    let mut out = vec![controls[0]];
    for i in 0..last {
        let (p0, p1) = (pts[i], pts[i + 1]);
        let (m0, m1) = (tangents[i], tangents[i + 1]);
        let n = sampling.intervals(span_length(&p0, &p1, &m0, &m1), min_per_span)?;
        for k in 1..=n {
            if k == n {
                out.push(controls[i + 1]);
                continue;
            }
            let t = k as f64 / n as f64;
            out.push(hermite(&p0, &p1, &m0, &m1, t).into());
        }
    }
    Ok(out)
}

fn hermite(
    p0: &Vector3<f64>,
    p1: &Vector3<f64>,
    m0: &Vector3<f64>,
    m1: &Vector3<f64>,
    t: f64,
) -> Vector3<f64> {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    *p0 * h00 + *m0 * h10 + *p1 * h01 + *m1 * h11
}

fn span_length(p0: &Vector3<f64>, p1: &Vector3<f64>, m0: &Vector3<f64>, m1: &Vector3<f64>) -> f64 {
    const STEPS: usize = 32;
    let mut length = 0.0;
    let mut prev = *p0;
    for k in 1..=STEPS {
        let cur = hermite(p0, p1, m0, m1, k as f64 / STEPS as f64);
        length += (cur - prev).norm();
        prev = cur;
    }
    length
}
