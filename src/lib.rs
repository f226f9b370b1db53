//! # femtowrite
//!
//! Geometry-to-toolpath compiler for femtosecond-laser written photonic
//! circuits. Waveguides, trenches and markers are laid out as continuous
//! laser paths and compiled into Aerotech PGM programs.
//!
//! ## Architecture
//!
//! femtowrite is organized as a workspace with multiple crates:
//!
//! 1. **femtowrite-core** - Points, tolerances, error types
//! 2. **femtowrite-designer** - Segments, primitive builders, transforms, devices
//! 3. **femtowrite-compiler** - Instruction stream, laser profiles, PGM output
//! 4. **femtowrite-settings** - JSON/TOML configuration
//! 5. **femtowrite** - Re-exports and the command line driver

pub mod demo;

pub use femtowrite_compiler as compiler;
pub use femtowrite_designer as designer;
pub use femtowrite_settings as settings;

pub use femtowrite_core::{
    BuildError, CompileError, Error, GeometryError, PathPoint, Point3, Result, SceneError,
};

pub use femtowrite_designer::{
    Device, Marker, MarkerParameters, Placement, Primitive, Transform, TransformStack, Trench,
    TrenchParameters, Waveguide, WaveguideParameters,
};

pub use femtowrite_compiler::{
    CompileFailure, CompilerParameters, Instruction, LaserProfile, PgmCompiler, Program,
};

pub use femtowrite_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
