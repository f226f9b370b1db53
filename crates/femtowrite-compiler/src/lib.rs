//! # femtowrite compiler
//!
//! Turns finalized photonic primitives into an Aerotech PGM toolpath.
//!
//! ## Components
//!
//! - **Instructions**: abstract machine commands, one PGM line each
//! - **Laser profiles**: header, PSO axis and shutter delay per fabrication line
//! - **Compiler**: scoped compilation run with machine-state bookkeeping,
//!   bounds checking, collinear merging and native arcs
//! - **Program**: the closed instruction stream, loop expansion, timing and
//!   `.pgm` output
//!
//! ```no_run
//! use femtowrite_compiler::{CompilerParameters, PgmCompiler};
//! use femtowrite_core::Point3;
//! use femtowrite_designer::{Waveguide, WaveguideParameters};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut wg = Waveguide::new(WaveguideParameters::default());
//! wg.start([-2.0, 4.5, 0.05])?.linear([29.0, 0.0, 0.0])?;
//! let wg = wg.end()?;
//!
//! let program = PgmCompiler::run(CompilerParameters::new("chip"), |gc| {
//!     gc.set_home(Point3::origin())?;
//!     gc.emit(&wg)
//! })?;
//! program.write_to_file()?;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod instruction;
pub mod parameters;
pub mod profile;
pub mod program;
pub mod state;
pub mod writer;

pub use compiler::{CompileFailure, PgmCompiler, DEFAULT_TASK};
pub use instruction::{Axes, Instruction, MotionMode, ShutterState};
pub use parameters::CompilerParameters;
pub use profile::LaserProfile;
pub use program::Program;
pub use state::CompilerState;
pub use writer::PgmWriter;
