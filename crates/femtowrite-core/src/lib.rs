//! # femtowrite core
//!
//! Core types shared by every femtowrite crate:
//! - [`Point3`] and [`PathPoint`] sample types
//! - numeric tolerances and controller constants
//! - the error taxonomy used by the designer, compiler and scene layers

pub mod constants;
pub mod error;
pub mod point;

pub use error::{BuildError, CompileError, Error, GeometryError, Result, SceneError};
pub use point::{PathPoint, Point3};
