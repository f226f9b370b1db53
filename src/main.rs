use anyhow::Context;
use femtowrite::settings::{default_config_path, Config};
use femtowrite::{demo, init_logging, BUILD_DATE, VERSION};
use std::path::PathBuf;
use tracing::{info, warn};

/// `femtowrite [CONFIG] [NAME]`
fn main() -> anyhow::Result<()> {
    init_logging()?;
    info!("femtowrite {} (built {})", VERSION, BUILD_DATE);

    let mut args = std::env::args().skip(1);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => Config::load_from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match default_config_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            Err(e) => {
                warn!("{}, using defaults", e);
                Config::default()
            }
        },
    };
    let name = args.next().unwrap_or_else(|| "MZI".to_string());

    let program = demo::compile_demo(&config, &name).context("Failed to compile demo chip")?;
    let path = program
        .write_to_file()
        .with_context(|| format!("Failed to write {}", program.file_path().display()))?;

    println!(
        "{}: {} instructions, {:.1} s estimated ({:.1} s of pauses)",
        path.display(),
        program.expanded_len(),
        program.estimated_duration(),
        program.dwell_time()
    );
    Ok(())
}
