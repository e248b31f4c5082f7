//! Command-line argument parsing for Aurora.

use std::path::PathBuf;

use aurora_atmosphere::CompositeMode;
use clap::Parser;

use crate::Config;

/// Aurora command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "aurora", about = "Planetary atmosphere renderer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Atmosphere composite mode (additive, attenuate).
    #[arg(long)]
    pub composite: Option<CompositeMode>,

    /// Samples along each view ray.
    #[arg(long)]
    pub scatter_points: Option<u32>,

    /// Samples along each optical depth integral.
    #[arg(long)]
    pub optical_depth_points: Option<u32>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(mode) = args.composite {
            self.render.composite = mode;
        }
        if let Some(points) = args.scatter_points {
            self.render.samples.scatter_points = points;
        }
        if let Some(points) = args.optical_depth_points {
            self.render.samples.optical_depth_points = points;
        }
    }
}
