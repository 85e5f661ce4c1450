use anyhow::{Context, Result};
use harris_corners::app::{load_config, run_detection};
use harris_corners::logger;
use log::LevelFilter;
use std::path::PathBuf;

fn main() -> Result<()> {
    let config: PathBuf = std::env::args()
        .nth(1)
        .context("usage: harris-corners <config.json>")?
        .into();
    let cfg = load_config(&config)?;

    let level = match cfg.log_level.as_deref() {
        Some(s) => logger::parse_level(s).map_err(anyhow::Error::msg)?,
        None => LevelFilter::Info,
    };
    logger::init(level).context("installing logger")?;

    let dump = run_detection(cfg)?;
    println!(
        "{}: {} candidates ({}x{}, {}-bit)",
        dump.image,
        dump.candidates.len(),
        dump.width,
        dump.height,
        dump.depth
    );
    Ok(())
}
