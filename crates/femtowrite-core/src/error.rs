//! Error handling for femtowrite
//!
//! Provides error types for every layer of the toolpath compiler:
//! - Geometry errors (segment generation, continuity, transforms)
//! - Build errors (primitive builder state machine)
//! - Compile errors (bounds, parameters, program bookkeeping)
//! - Scene errors (device aggregation)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised by segment generators, path continuity checks and the transform
/// pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Zero radius with nonzero sweep, non-positive length, non-finite input
    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry {
        /// What made the geometry degenerate.
        reason: String,
    },

    /// Two chained segments do not meet
    #[error("Discontinuity of {gap:.3e} mm between segments (tolerance {tolerance:.1e} mm)")]
    Discontinuity {
        /// Distance between the previous endpoint and the new start point.
        gap: f64,
        /// Tolerance that was exceeded.
        tolerance: f64,
    },

    /// A transform was pushed out of pipeline order
    #[error("Transform '{transform}' cannot follow '{previous}'")]
    InvalidTransformOrder {
        /// The last transform already in the stack.
        previous: String,
        /// The transform that was rejected.
        transform: String,
    },

    /// A warp surface could not be fitted to the calibration samples
    #[error("Surface fit failed: {reason}")]
    FitFailed {
        /// The reason the fit failed.
        reason: String,
    },
}

impl GeometryError {
    /// Shorthand for [`GeometryError::DegenerateGeometry`].
    pub fn degenerate(reason: impl Into<String>) -> Self {
        GeometryError::DegenerateGeometry {
            reason: reason.into(),
        }
    }
}

/// Primitive builder error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A builder method was called outside its allowed state
    #[error("Invalid state: cannot call '{operation}' while {state}")]
    InvalidState {
        /// The operation that was attempted.
        operation: String,
        /// The builder state at the time of the call.
        state: String,
    },

    /// Segment generation failed
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Toolpath compiler error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A compiled coordinate lies outside the declared sample area
    #[error(
        "Point ({x:.6}, {y:.6}, {z:.6}) is out of bounds \
         (x: {x_min:.3}..{x_max:.3}, y: {y_min:.3}..{y_max:.3})"
    )]
    OutOfBounds {
        x: f64,
        y: f64,
        z: f64,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    /// A compiler parameter or command argument is invalid
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A loop variable was used before being declared
    #[error("Variable ${0} has not been declared")]
    UndeclaredVariable(String),

    /// A program was called or removed before being loaded
    #[error("Program '{0}' is not loaded")]
    ProgramNotLoaded(String),

    /// Transforming the primitive failed
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl CompileError {
    /// Shorthand for [`CompileError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Scene aggregation error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A primitive with the same identifier is already in the scene
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),
}

/// Main error type for femtowrite
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Builder error
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Compiler error
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Scene error
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an out-of-bounds compile error
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Error::Compile(CompileError::OutOfBounds { .. }))
    }

    /// Check if this is a degenerate geometry error, at any layer
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            Error::Geometry(GeometryError::DegenerateGeometry { .. })
                | Error::Build(BuildError::Geometry(
                    GeometryError::DegenerateGeometry { .. }
                ))
                | Error::Compile(CompileError::Geometry(
                    GeometryError::DegenerateGeometry { .. }
                ))
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::degenerate("radius is zero");
        assert_eq!(err.to_string(), "Degenerate geometry: radius is zero");

        let err = GeometryError::InvalidTransformOrder {
            previous: "warp".to_string(),
            transform: "translation".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Transform 'translation' cannot follow 'warp'"
        );
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::InvalidState {
            operation: "start".to_string(),
            state: "building".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state: cannot call 'start' while building"
        );
    }

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::UndeclaredVariable("I".to_string());
        assert_eq!(err.to_string(), "Variable $I has not been declared");

        let err = CompileError::invalid("feed_rate", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'feed_rate': must be positive"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = SceneError::DuplicateIdentifier("wg1".to_string()).into();
        assert!(matches!(err, Error::Scene(_)));

        let err: Error = BuildError::from(GeometryError::degenerate("zero length")).into();
        assert!(err.is_degenerate());

        let err: Error = CompileError::OutOfBounds {
            x: 200.0,
            y: 0.0,
            z: 0.0,
            x_min: 0.0,
            x_max: 100.0,
            y_min: 0.0,
            y_max: 50.0,
        }
        .into();
        assert!(err.is_out_of_bounds());
    }
}
