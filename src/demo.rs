//! Demonstration chip: a pair of Mach-Zehnder interferometer arms written
//! across the whole sample.

use femtowrite_compiler::{PgmCompiler, Program};
use femtowrite_core::{Point3, Result};
use femtowrite_designer::{Device, Waveguide, WaveguideParameters};
use femtowrite_settings::Config;
use tracing::info;

/// Overshoot beyond each sample edge (mm).
const EDGE_OVERSHOOT: f64 = 2.0;

/// Builds `count` MZI arms centred on `y0`, alternating bend direction,
/// running from `-2` to `length + 2` along x.
pub fn mzi_device(params: &WaveguideParameters, count: usize, y0: f64, length: f64) -> Result<Device> {
    let mut device = Device::new("mzi");
    let first = y0 - params.pitch * (count.saturating_sub(1)) as f64 / 2.0;
    for i in 0..count {
        let y = first + i as f64 * params.pitch;
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let mut wg = Waveguide::with_id(format!("mzi-{}", i), params.clone());
        wg.start([-EDGE_OVERSHOOT, y, params.depth])?
            .linear([5.0, 0.0, 0.0])?
            .arc_mzi(sign * params.dy_bend())?
            .linear_to([length + EDGE_OVERSHOOT, y, params.depth])?;
        device.add(wg.end()?)?;
    }
    Ok(device)
}

/// Compiles the two-arm demo chip with the settings of `config`.
pub fn compile_demo(config: &Config, name: &str) -> Result<Program> {
    let params = config.compiler_parameters(name);
    let device = mzi_device(
        &config.waveguide_parameters(),
        2,
        params.y_sample() / 2.0,
        params.x_sample(),
    )?;
    info!("Demo chip '{}' with {} waveguides", device.name(), device.len());

    PgmCompiler::run(params, |gc| {
        gc.set_home(Point3::origin())?;
        for (i, wg) in device.primitives().enumerate() {
            gc.comment(format!("Modo: {}", i));
            gc.emit(wg)?;
        }
        Ok(())
    })
    .map_err(|failure| failure.source.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use femtowrite_compiler::LaserProfile;

    #[test]
    fn test_mzi_device_spacing() {
        let params = WaveguideParameters::default();
        let device = mzi_device(&params, 2, 10.0, 30.0).unwrap();
        let starts: Vec<f64> = device
            .primitives()
            .map(|p| p.start_point().unwrap().y)
            .collect();
        assert!((starts[0] - (10.0 - params.pitch / 2.0)).abs() < 1e-12);
        assert!((starts[1] - starts[0] - params.pitch).abs() < 1e-12);
    }

    #[test]
    fn test_compile_demo() {
        let program = compile_demo(&Config::default(), "demo").unwrap();
        let text = program.to_pgm();
        assert!(text.contains("G92 X0.000000 Y0.000000 Z0.000000"));
        assert!(text.contains("; Modo: 1\n"));
        assert!(text.contains("X102.000000"));
    }

    #[test]
    fn test_demo_from_saved_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("femtowrite.toml");

        let mut config = Config::new();
        config.compiler.laser = LaserProfile::Uwe;
        config.compiler.sample_size = (25.0, 10.0);
        config.compiler.export_dir = Some(dir.path().join("pgm"));
        config.waveguide.scan = 3;
        config.save_to_file(&config_path).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        let program = compile_demo(&config, "chip").unwrap();
        let path = program.write_to_file().unwrap();
        assert_eq!(path, dir.path().join("pgm").join("chip.pgm"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("WAIT MODE NOWAIT"));
        assert_eq!(text.matches("REPEAT 3\n").count(), 2);
        assert!(text.contains("X27.000000"));
    }

    #[test]
    fn test_demo_overshoot_outside_margin() {
        let mut config = Config::new();
        // arms overshoot the sample by 2 mm, the margin is 1 mm
        config.compiler.bounds_margin = 1.0;
        assert!(compile_demo(&config, "chip").unwrap_err().is_out_of_bounds());
    }
}
