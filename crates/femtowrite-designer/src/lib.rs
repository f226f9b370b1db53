//! # femtowrite designer
//!
//! Layout tools for femtosecond-laser written photonic circuits. Optical
//! primitives are built as continuous laser paths, placed in a device and
//! handed to the toolpath compiler.
//!
//! ## Components
//!
//! - **Segments**: lines, circular arcs, sinusoidal arcs and Hermite splines
//! - **Builders**: [`Waveguide`], [`Trench`] and [`Marker`] on top of a shared
//!   [`PathBuilder`] state machine (unstarted, building, finalized)
//! - **Transforms**: homothety, flip, rotation, translation and warp
//!   compensation in a fixed pipeline order
//! - **Warp fitting**: pluggable surface fitters for measured sample heights
//! - **Device**: ordered, identifier-checked collection of placed primitives
//!
//! ```text
//! segments -> builders -> Primitive -> Device
//!                                        |
//!                          TransformStack + compiler
//! ```

pub mod device;
pub mod marker;
pub mod path_builder;
pub mod primitive;
pub mod segments;
pub mod transform;
pub mod trench;
pub mod warp;
pub mod waveguide;

pub use device::{Device, DeviceEntry, DeviceLoadError, Placement, ToolpathSink};
pub use marker::{Marker, MarkerParameters};
pub use path_builder::{BuilderState, LinearMode, PathBuilder};
pub use primitive::{BoundingBox, Primitive, PrimitiveKind, ScanSettings};
pub use segments::{ArcDirection, PathSegment, Sampling, SegmentKind, SineOffsets};
pub use transform::{MappedArc, Transform, TransformStack, TransformStage, WarpCompensation};
pub use trench::{Trench, TrenchParameters};
pub use warp::{
    calibration_grid, CalibrationPoint, FlatFit, FlatSurface, InverseDistanceFit,
    PolynomialFit, SurfaceFitter, WarpSurface,
};
pub use waveguide::{Waveguide, WaveguideParameters};
