//! Opens the Aurora viewer window.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags:
//! `aurora-app --width 1920 --height 1080 --composite attenuate`.

use aurora_config::{CliArgs, Config, default_config_dir};
use clap::Parser;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    aurora_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        planets = config.scene.planets.len(),
        composite = %config.render.composite,
        "Starting Aurora"
    );

    if let Err(e) = aurora_app::run_with_config(config) {
        tracing::error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
