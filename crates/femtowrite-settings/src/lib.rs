//! femtowrite Settings Crate
//!
//! Fabrication defaults for the compiler and the primitive builders, stored
//! as JSON or TOML files.

pub mod config;
pub mod error;

pub use config::{default_config_path, Config, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use error::{SettingsError, SettingsResult};
