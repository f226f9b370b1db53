//! Geometric transforms applied to laser paths before compilation.
//!
//! A [`TransformStack`] applies its transforms in a fixed pipeline order:
//! homothety, flip, rotation, translation, warp compensation. Transforms are
//! pure: applying one returns new points and never touches the input.

use crate::segments::ArcDirection;
use crate::warp::WarpSurface;
use femtowrite_core::constants::EPSILON;
use femtowrite_core::{GeometryError, PathPoint, Point3};
use nalgebra::{Matrix4, Vector4};
use std::fmt;
use std::sync::Arc;

/// Pipeline position of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformStage {
    Homothety,
    Flip,
    Rotation,
    Translation,
    Warp,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformStage::Homothety => "homothety",
            TransformStage::Flip => "flip",
            TransformStage::Rotation => "rotation",
            TransformStage::Translation => "translation",
            TransformStage::Warp => "warp",
        };
        write!(f, "{}", name)
    }
}

/// z correction from a fitted sample surface: `z += height(x, y) * scale`.
#[derive(Debug, Clone)]
pub struct WarpCompensation {
    pub surface: Arc<dyn WarpSurface>,
    pub scale: f64,
}

impl WarpCompensation {
    pub fn new(surface: Arc<dyn WarpSurface>, scale: f64) -> Self {
        Self { surface, scale }
    }

    /// Correction scaled for the effective refractive index.
    pub fn for_index(surface: Arc<dyn WarpSurface>, neff: f64) -> Self {
        Self::new(surface, 1.0 / neff)
    }

    pub fn offset(&self, x: f64, y: f64) -> f64 {
        self.surface.height(x, y) * self.scale
    }
}

/// A single geometric transform.
#[derive(Debug, Clone)]
pub enum Transform {
    /// Per-axis scale about the origin
    Homothety { sx: f64, sy: f64, sz: f64 },
    /// Reflection of x and/or y about the origin
    Flip { x: bool, y: bool },
    /// Rotation about the z axis through `pivot`
    Rotation { angle: f64, pivot: Point3 },
    Translation { offset: Point3 },
    Warp(WarpCompensation),
}

impl Transform {
    pub fn homothety(sx: f64, sy: f64, sz: f64) -> Self {
        Transform::Homothety { sx, sy, sz }
    }

    /// Depth compensation `z / n_eff` for writing below an interface.
    pub fn index_compensation(neff: f64) -> Self {
        Transform::homothety(1.0, 1.0, 1.0 / neff)
    }

    pub fn flip(x: bool, y: bool) -> Self {
        Transform::Flip { x, y }
    }

    /// Rotation about the origin by `angle` radians.
    pub fn rotation(angle: f64) -> Self {
        Transform::Rotation {
            angle,
            pivot: Point3::origin(),
        }
    }

    pub fn rotation_about(angle: f64, pivot: Point3) -> Self {
        Transform::Rotation { angle, pivot }
    }

    pub fn translation(offset: impl Into<Point3>) -> Self {
        Transform::Translation {
            offset: offset.into(),
        }
    }

    pub fn warp(compensation: WarpCompensation) -> Self {
        Transform::Warp(compensation)
    }

    pub fn stage(&self) -> TransformStage {
        match self {
            Transform::Homothety { .. } => TransformStage::Homothety,
            Transform::Flip { .. } => TransformStage::Flip,
            Transform::Rotation { .. } => TransformStage::Rotation,
            Transform::Translation { .. } => TransformStage::Translation,
            Transform::Warp(_) => TransformStage::Warp,
        }
    }

    pub fn apply_point(&self, p: Point3) -> Point3 {
        match self {
            Transform::Homothety { sx, sy, sz } => Point3::new(p.x * sx, p.y * sy, p.z * sz),
            Transform::Flip { x, y } => Point3::new(
                if *x { -p.x } else { p.x },
                if *y { -p.y } else { p.y },
                p.z,
            ),
            Transform::Rotation { angle, pivot } => {
                let (s, c) = angle.sin_cos();
                let dx = p.x - pivot.x;
                let dy = p.y - pivot.y;
                Point3::new(pivot.x + c * dx - s * dy, pivot.y + s * dx + c * dy, p.z)
            }
            Transform::Translation { offset } => p + *offset,
            Transform::Warp(w) => Point3::new(p.x, p.y, p.z + w.offset(p.x, p.y)),
        }
    }

    pub fn apply(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|&p| self.apply_point(p)).collect()
    }

    /// Inverse transform, `None` for destructive ones.
    pub fn inverse(&self) -> Option<Transform> {
        match self {
            Transform::Homothety { sx, sy, sz } => {
                if [sx, sy, sz].iter().any(|s| s.abs() <= EPSILON) {
                    None
                } else {
                    Some(Transform::homothety(1.0 / sx, 1.0 / sy, 1.0 / sz))
                }
            }
            Transform::Flip { .. } => Some(self.clone()),
            Transform::Rotation { angle, pivot } => Some(Transform::rotation_about(-angle, *pivot)),
            Transform::Translation { offset } => Some(Transform::translation(Point3::origin() - *offset)),
            Transform::Warp(_) => None,
        }
    }

    /// Homogeneous matrix of an affine transform; `None` for warp.
    pub fn matrix(&self) -> Option<Matrix4<f64>> {
        let m = match self {
            Transform::Homothety { sx, sy, sz } => Matrix4::new_nonuniform_scaling(
                &nalgebra::Vector3::new(*sx, *sy, *sz),
            ),
            Transform::Flip { x, y } => Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(
                if *x { -1.0 } else { 1.0 },
                if *y { -1.0 } else { 1.0 },
                1.0,
            )),
            Transform::Rotation { angle, pivot } => {
                let to = Matrix4::new_translation(&pivot.to_vector());
                let from = Matrix4::new_translation(&(-pivot.to_vector()));
                let (s, c) = angle.sin_cos();
                #[rustfmt::skip]
                let rot = Matrix4::new(
                    c,  -s,  0.0, 0.0,
                    s,   c,  0.0, 0.0,
                    0.0, 0.0, 1.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                );
                to * rot * from
            }
            Transform::Translation { offset } => Matrix4::new_translation(&offset.to_vector()),
            Transform::Warp(_) => return None,
        };
        Some(m)
    }
}

/// Image of a circle under a stack that maps circles to circles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedArc {
    pub center: Point3,
    pub radius: f64,
    pub direction: ArcDirection,
}

/// Ordered pipeline of transforms.
#[derive(Debug, Clone, Default)]
pub struct TransformStack {
    transforms: Vec<Transform>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform, enforcing pipeline order.
    pub fn push(&mut self, transform: Transform) -> Result<&mut Self, GeometryError> {
        if let Some(last) = self.transforms.last() {
            let (prev, next) = (last.stage(), transform.stage());
            if prev == TransformStage::Warp || next < prev {
                return Err(GeometryError::InvalidTransformOrder {
                    previous: prev.to_string(),
                    transform: next.to_string(),
                });
            }
        }
        self.transforms.push(transform);
        Ok(self)
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, transform: Transform) -> Result<Self, GeometryError> {
        self.push(transform)?;
        Ok(self)
    }

    /// Runs `self` first, then `next`. Only the last stack of a chain may
    /// carry a warp.
    pub fn then(&self, next: &TransformStack) -> Result<TransformStack, GeometryError> {
        if let (Some(last), Some(first)) = (self.transforms.last(), next.transforms.first()) {
            if self.has_warp() {
                return Err(GeometryError::InvalidTransformOrder {
                    previous: last.stage().to_string(),
                    transform: first.stage().to_string(),
                });
            }
        }
        let mut transforms = self.transforms.clone();
        transforms.extend(next.transforms.iter().cloned());
        Ok(TransformStack { transforms })
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter()
    }

    pub fn has_warp(&self) -> bool {
        self.transforms
            .iter()
            .any(|t| t.stage() == TransformStage::Warp)
    }

    pub fn apply_point(&self, p: Point3) -> Point3 {
        self.transforms.iter().fold(p, |acc, t| t.apply_point(acc))
    }

    pub fn apply(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|&p| self.apply_point(p)).collect()
    }

    /// Transforms positions, keeping feed rates and laser state.
    pub fn apply_path(&self, points: &[PathPoint]) -> Vec<PathPoint> {
        points
            .iter()
            .map(|p| p.with_position(self.apply_point(p.position)))
            .collect()
    }

    /// Inverse pipeline, `None` if any transform is destructive.
    pub fn inverse(&self) -> Option<TransformStack> {
        let transforms = self
            .transforms
            .iter()
            .rev()
            .map(Transform::inverse)
            .collect::<Option<Vec<_>>>()?;
        Some(TransformStack { transforms })
    }

    /// Composite homogeneous matrix of the affine transforms.
    pub fn affine(&self) -> Matrix4<f64> {
        self.transforms
            .iter()
            .filter_map(Transform::matrix)
            .fold(Matrix4::identity(), |acc, m| m * acc)
    }

    /// Maps an xy-plane arc through the stack.
    ///
    /// Returns `None` when the image is not a circular arc: with a warp in the
    /// stack or when the xy part is not a similarity.
    pub fn map_arc(&self, center: Point3, radius: f64, direction: ArcDirection) -> Option<MappedArc> {
        if self.has_warp() {
            return None;
        }
        let m = self.affine();
        let (a, b, c, d) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        let col0 = a * a + c * c;
        let col1 = b * b + d * d;
        let tol = 1e-9 * col0.max(col1).max(1.0);
        if (col0 - col1).abs() > tol || (a * b + c * d).abs() > tol {
            return None;
        }
        // z must not depend on x or y
        if m[(2, 0)].abs() > EPSILON || m[(2, 1)].abs() > EPSILON {
            return None;
        }
        let det = a * d - b * c;
        if det.abs() <= EPSILON {
            return None;
        }
        let h = m * Vector4::new(center.x, center.y, center.z, 1.0);
        Some(MappedArc {
            center: Point3::new(h.x, h.y, h.z),
            radius: radius * det.abs().sqrt(),
            direction: if det < 0.0 {
                direction.reversed()
            } else {
                direction
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warp::FlatSurface;
    use std::f64::consts::FRAC_PI_2;

    fn warp() -> Transform {
        Transform::warp(WarpCompensation::new(Arc::new(FlatSurface), 1.0))
    }

    #[test]
    fn test_order_enforced() {
        let mut stack = TransformStack::new();
        stack
            .push(Transform::index_compensation(1.5 / 1.33))
            .unwrap()
            .push(Transform::rotation(0.1))
            .unwrap()
            .push(Transform::translation([1.0, 2.0, 0.0]))
            .unwrap();
        let err = stack.push(Transform::flip(true, false)).unwrap_err();
        assert_eq!(
            err,
            GeometryError::InvalidTransformOrder {
                previous: "translation".to_string(),
                transform: "flip".to_string(),
            }
        );
        stack.push(warp()).unwrap();
        assert!(stack.push(warp()).is_err());
        assert!(stack.push(Transform::translation([0.0, 0.0, 0.0])).is_err());
    }

    #[test]
    fn test_then_requires_no_warp_in_front() {
        let placed = TransformStack::new()
            .with(Transform::translation([5.0, 0.0, 0.0]))
            .unwrap();
        let global = TransformStack::new()
            .with(Transform::rotation(FRAC_PI_2))
            .unwrap()
            .with(warp())
            .unwrap();
        let chained = placed.then(&global).unwrap();
        assert_eq!(chained.len(), 3);
        let p = chained.apply_point(Point3::new(1.0, 0.0, 0.0));
        assert!(p.approx_eq(&Point3::new(0.0, 6.0, 0.0), 1e-12));

        assert!(global.then(&placed).is_err());
        assert!(global.then(&TransformStack::new()).is_ok());
    }

    #[test]
    fn test_apply_does_not_mutate() {
        let pts = vec![Point3::new(1.0, 1.0, 1.0)];
        let moved = Transform::translation([1.0, 0.0, 0.0]).apply(&pts);
        assert_eq!(pts[0], Point3::new(1.0, 1.0, 1.0));
        assert_eq!(moved[0], Point3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn test_destructive_inverses() {
        assert!(Transform::homothety(1.0, 0.0, 1.0).inverse().is_none());
        assert!(warp().inverse().is_none());
        let stack = TransformStack::new().with(warp()).unwrap();
        assert!(stack.inverse().is_none());
    }

    #[test]
    fn test_flip_and_rotation_about_pivot() {
        let p = Transform::flip(true, false).apply_point(Point3::new(2.0, 3.0, 0.1));
        assert_eq!(p, Point3::new(-2.0, 3.0, 0.1));
        let r = Transform::rotation_about(FRAC_PI_2, Point3::new(1.0, 1.0, 0.0))
            .apply_point(Point3::new(2.0, 1.0, 0.5));
        assert!(r.approx_eq(&Point3::new(1.0, 2.0, 0.5), 1e-12));
    }

    #[test]
    fn test_matrix_matches_point_map() {
        let stack = TransformStack::new()
            .with(Transform::homothety(2.0, 2.0, 0.5))
            .unwrap()
            .with(Transform::flip(false, true))
            .unwrap()
            .with(Transform::rotation_about(0.3, Point3::new(1.0, -1.0, 0.0)))
            .unwrap()
            .with(Transform::translation([4.0, 5.0, 6.0]))
            .unwrap();
        let p = Point3::new(0.7, -0.2, 0.9);
        let h = stack.affine() * Vector4::new(p.x, p.y, p.z, 1.0);
        assert!(stack
            .apply_point(p)
            .approx_eq(&Point3::new(h.x, h.y, h.z), 1e-12));
    }

    #[test]
    fn test_map_arc() {
        let stack = TransformStack::new()
            .with(Transform::homothety(2.0, 2.0, 1.0))
            .unwrap()
            .with(Transform::flip(true, false))
            .unwrap()
            .with(Transform::translation([1.0, 0.0, 0.0]))
            .unwrap();
        let mapped = stack
            .map_arc(Point3::new(0.0, 10.0, 0.0), 10.0, ArcDirection::CounterClockwise)
            .unwrap();
        assert!(mapped.center.approx_eq(&Point3::new(1.0, 20.0, 0.0), 1e-12));
        assert!((mapped.radius - 20.0).abs() < 1e-12);
        assert_eq!(mapped.direction, ArcDirection::Clockwise);

        let squashed = TransformStack::new()
            .with(Transform::homothety(1.0, 2.0, 1.0))
            .unwrap();
        assert!(squashed
            .map_arc(Point3::origin(), 1.0, ArcDirection::Clockwise)
            .is_none());

        let warped = TransformStack::new().with(warp()).unwrap();
        assert!(warped
            .map_arc(Point3::origin(), 1.0, ArcDirection::Clockwise)
            .is_none());
    }
}
