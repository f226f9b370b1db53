//! Sample surface models for warp compensation.
//!
//! The focus height measured at a few `(x, y)` positions of the sample is
//! fitted by a [`SurfaceFitter`] into a [`WarpSurface`], which the transform
//! stack evaluates for every path point.

use femtowrite_core::constants::EPSILON;
use femtowrite_core::GeometryError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A measured focus height on the sample surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub x: f64,
    pub y: f64,
    /// Surface height at `(x, y)` (mm)
    pub height: f64,
}

impl CalibrationPoint {
    pub fn new(x: f64, y: f64, height: f64) -> Self {
        Self { x, y, height }
    }
}

/// Deterministic height field over the sample.
pub trait WarpSurface: fmt::Debug + Send + Sync {
    fn height(&self, x: f64, y: f64) -> f64;
}

/// Fits a surface to calibration samples.
pub trait SurfaceFitter {
    fn fit(&self, samples: &[CalibrationPoint]) -> Result<Arc<dyn WarpSurface>, GeometryError>;
}

/// Grid of positions to measure, `margin` mm inside the sample edges.
///
/// `num` is the requested total number of points; the grid is square with
/// `ceil(sqrt(num))` positions per side.
pub fn calibration_grid(size_x: f64, size_y: f64, num: usize, margin: f64) -> Vec<(f64, f64)> {
    let side = (num as f64).sqrt().ceil() as usize;
    let linspace = |lo: f64, hi: f64| -> Vec<f64> {
        match side {
            0 => Vec::new(),
            1 => vec![(lo + hi) / 2.0],
            n => (0..n)
                .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
                .collect(),
        }
    };
    let xs = linspace(margin, size_x - margin);
    let ys = linspace(margin, size_y - margin);
    xs.iter()
        .flat_map(|&x| ys.iter().map(move |&y| (x, y)))
        .collect()
}

/// A perfectly flat sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatSurface;

impl WarpSurface for FlatSurface {
    fn height(&self, _x: f64, _y: f64) -> f64 {
        0.0
    }
}

/// Fitter ignoring the samples and returning [`FlatSurface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatFit;

impl SurfaceFitter for FlatFit {
    fn fit(&self, _samples: &[CalibrationPoint]) -> Result<Arc<dyn WarpSurface>, GeometryError> {
        Ok(Arc::new(FlatSurface))
    }
}

/// Bivariate polynomial in normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialSurface {
    order: usize,
    center: (f64, f64),
    scale: f64,
    coefficients: Vec<f64>,
}

impl PolynomialSurface {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn terms(order: usize, u: f64, v: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity((order + 1) * (order + 2) / 2);
        for degree in 0..=order {
            for j in 0..=degree {
                out.push(u.powi((degree - j) as i32) * v.powi(j as i32));
            }
        }
        out
    }
}

impl WarpSurface for PolynomialSurface {
    fn height(&self, x: f64, y: f64) -> f64 {
        let u = (x - self.center.0) / self.scale;
        let v = (y - self.center.1) / self.scale;
        Self::terms(self.order, u, v)
            .iter()
            .zip(&self.coefficients)
            .map(|(t, c)| t * c)
            .sum()
    }
}

/// Least-squares polynomial fit. Order 1 is a plane.
#[derive(Debug, Clone, Copy)]
pub struct PolynomialFit {
    pub order: usize,
}

impl PolynomialFit {
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    pub fn plane() -> Self {
        Self::new(1)
    }

    pub fn term_count(&self) -> usize {
        (self.order + 1) * (self.order + 2) / 2
    }
}

impl SurfaceFitter for PolynomialFit {
    fn fit(&self, samples: &[CalibrationPoint]) -> Result<Arc<dyn WarpSurface>, GeometryError> {
        let terms = self.term_count();
        if samples.len() < terms {
            return Err(GeometryError::FitFailed {
                reason: format!(
                    "order {} needs at least {} samples, got {}",
                    self.order,
                    terms,
                    samples.len()
                ),
            });
        }
        if samples
            .iter()
            .any(|s| !(s.x.is_finite() && s.y.is_finite() && s.height.is_finite()))
        {
            return Err(GeometryError::FitFailed {
                reason: "non-finite calibration sample".to_string(),
            });
        }

        let n = samples.len() as f64;
        let cx = samples.iter().map(|s| s.x).sum::<f64>() / n;
        let cy = samples.iter().map(|s| s.y).sum::<f64>() / n;
        let scale = samples
            .iter()
            .map(|s| (s.x - cx).abs().max((s.y - cy).abs()))
            .fold(0.0, f64::max)
            .max(EPSILON);

        let rows: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| PolynomialSurface::terms(self.order, (s.x - cx) / scale, (s.y - cy) / scale))
            .collect();
        let a = DMatrix::from_fn(samples.len(), terms, |r, c| rows[r][c]);
        let b = DVector::from_iterator(samples.len(), samples.iter().map(|s| s.height));

        let svd = a.svd(true, true);
        let rank = svd.rank(1e-10);
        if rank < terms {
            return Err(GeometryError::FitFailed {
                reason: format!("samples do not determine an order {} surface", self.order),
            });
        }
        let solution = svd
            .solve(&b, 1e-12)
            .map_err(|e| GeometryError::FitFailed {
                reason: e.to_string(),
            })?;

        Ok(Arc::new(PolynomialSurface {
            order: self.order,
            center: (cx, cy),
            scale,
            coefficients: solution.iter().copied().collect(),
        }))
    }
}

/// Surface interpolating the samples by inverse-distance weighting.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseDistanceSurface {
    samples: Vec<CalibrationPoint>,
    power: f64,
}

impl WarpSurface for InverseDistanceSurface {
    fn height(&self, x: f64, y: f64) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for s in &self.samples {
            let d = (s.x - x).hypot(s.y - y);
            if d <= EPSILON {
                return s.height;
            }
            let w = d.powf(-self.power);
            weighted += w * s.height;
            total += w;
        }
        weighted / total
    }
}

/// Inverse-distance weighting fitter.
#[derive(Debug, Clone, Copy)]
pub struct InverseDistanceFit {
    pub power: f64,
}

impl Default for InverseDistanceFit {
    fn default() -> Self {
        Self { power: 2.0 }
    }
}

impl SurfaceFitter for InverseDistanceFit {
    fn fit(&self, samples: &[CalibrationPoint]) -> Result<Arc<dyn WarpSurface>, GeometryError> {
        if samples.is_empty() {
            return Err(GeometryError::FitFailed {
                reason: "no calibration samples".to_string(),
            });
        }
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(GeometryError::FitFailed {
                reason: format!("weighting power must be positive, got {}", self.power),
            });
        }
        Ok(Arc::new(InverseDistanceSurface {
            samples: samples.to_vec(),
            power: self.power,
        }))
    }
}
