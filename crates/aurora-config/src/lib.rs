//! Configuration for the Aurora renderer.
//!
//! Settings persist to disk as RON (`config.ron`) and can be overridden from
//! the command line. Every section defaults its missing fields, so older and
//! newer config files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CameraConfig, Config, DebugConfig, PlanetDesc, RenderConfig, SceneConfig,
    WindowConfig, default_config_dir,
};
pub use error::ConfigError;
