//! Numeric tolerances and controller constants.

/// Maximum gap (mm) between chained segments that is absorbed by snapping
/// to the previous endpoint. Larger gaps are reported as discontinuities.
pub const CONTINUITY_TOLERANCE: f64 = 1e-6;

/// Maximum distance (mm) of an intermediate sample from the chord joining
/// its neighbours for the sample to be merged into a single linear move.
pub const COLLINEAR_TOLERANCE: f64 = 1e-7;

/// Tolerance used when comparing floating point lengths and angles.
pub const EPSILON: f64 = 1e-12;

/// Command rate of the motion controller (commands per second).
/// Sample spacing defaults to `speed / CMD_RATE_MAX`.
pub const CMD_RATE_MAX: f64 = 1200.0;

/// Minimum number of samples for curved segments.
pub const MIN_CURVE_POINTS: usize = 10;

/// Minimum number of samples for straight segments (start and end).
pub const MIN_LINE_POINTS: usize = 2;

/// Upper bound on the samples of a single segment.
pub const MAX_SEGMENT_POINTS: usize = 10_000_000;

/// Default x coordinate where waveguides start, outside the sample edge.
pub const X_INIT: f64 = -2.0;
