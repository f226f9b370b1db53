//! Configuration file handling for femtowrite
//!
//! A config holds the defaults of one fabrication setup:
//! - Compiler settings (laser, sample geometry, pauses, output)
//! - Waveguide writing parameters
//! - Trench and marker parameters
//!
//! Files are JSON or TOML, selected by extension, and are validated after
//! loading and before saving.

use crate::error::{SettingsError, SettingsResult};
use femtowrite_compiler::CompilerParameters;
use femtowrite_designer::{MarkerParameters, TrenchParameters, WaveguideParameters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory below the platform config dir.
pub const CONFIG_DIR_NAME: &str = "femtowrite";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
            other => Err(SettingsError::UnsupportedFormat(format!(
                "{} (config file must be .json or .toml)",
                other.unwrap_or("no extension")
            ))),
        }
    }
}

/// Platform config path, e.g. `~/.config/femtowrite/config.toml` on Linux.
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| SettingsError::ConfigDirectory("no config directory on this platform".to_string()))
}

/// Complete fabrication configuration.
///
/// Missing sections and keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerParameters,
    pub waveguide: WaveguideParameters,
    pub trench: TrenchParameters,
    pub marker: MarkerParameters,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, or returns the defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.compiler.validate()?;

        let w = &self.waveguide;
        check_pass("waveguide", w.scan, w.speed, w.speed_closed, w.point_spacing)?;
        positive("waveguide.radius", w.radius)?;
        positive("waveguide.pitch", w.pitch)?;
        non_negative("waveguide.int_dist", w.int_dist)?;
        non_negative("waveguide.int_length", w.int_length)?;
        non_negative("waveguide.arm_length", w.arm_length)?;
        if w.int_dist > w.pitch {
            return Err(SettingsError::invalid(
                "waveguide.int_dist",
                format!("interaction distance {} exceeds pitch {}", w.int_dist, w.pitch),
            ));
        }

        let t = &self.trench;
        check_pass("trench", t.scan, t.speed, t.speed_closed, t.point_spacing)?;
        positive("trench.length", t.length)?;
        positive("trench.width", t.width)?;
        non_negative("trench.height", t.height)?;
        positive("trench.wall_step", t.wall_step)?;
        positive("trench.floor_pitch", t.floor_pitch)?;

        let m = &self.marker;
        check_pass("marker", m.scan, m.speed, m.speed_closed, m.point_spacing)?;
        positive("marker.lx", m.lx)?;
        positive("marker.ly", m.ly)?;

        Ok(())
    }

    /// Compiler parameters with the program name replaced.
    pub fn compiler_parameters(&self, filename: impl Into<String>) -> CompilerParameters {
        CompilerParameters {
            filename: filename.into(),
            ..self.compiler.clone()
        }
    }

    pub fn waveguide_parameters(&self) -> WaveguideParameters {
        self.waveguide.clone()
    }

    pub fn trench_parameters(&self) -> TrenchParameters {
        self.trench.clone()
    }

    pub fn marker_parameters(&self) -> MarkerParameters {
        self.marker.clone()
    }
}

fn positive(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, format!("must be > 0, got {}", value)))
    }
}

fn non_negative(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, format!("must be >= 0, got {}", value)))
    }
}

fn check_pass(
    section: &str,
    scan: u32,
    speed: f64,
    speed_closed: f64,
    point_spacing: Option<f64>,
) -> SettingsResult<()> {
    if scan == 0 {
        return Err(SettingsError::invalid(
            format!("{}.scan", section),
            "number of passes must be at least 1",
        ));
    }
    positive(&format!("{}.speed", section), speed)?;
    positive(&format!("{}.speed_closed", section), speed_closed)?;
    if let Some(spacing) = point_spacing {
        positive(&format!("{}.point_spacing", section), spacing)?;
    }
    Ok(())
}
