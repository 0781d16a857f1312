//! Draws a triangle until the window is closed

use anyhow::{Context, Result};
use hello_triangle::{
    logging::{init_logging, LoggingConfig},
    AppConfig,
};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = AppConfig::default();
    log::info!(
        "Starting: {}x{} window, shaders {} and {}",
        config.width,
        config.height,
        config.vertex_shader.display(),
        config.fragment_shader.display()
    );

    let summary =
        hello_triangle::run(config).context("renderer setup or frame loop failed")?;

    log::info!(
        "Window closed. Total frames rendered on {}: {}",
        summary.device_name,
        summary.frames_presented
    );

    Ok(())
}
