//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use aurora_atmosphere::{AtmosphereOptions, CompositeMode, SampleCounts, SunModel};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Platform config directory for Aurora, e.g. `~/.config/aurora` on Linux.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aurora")
}

/// Top-level renderer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Sun, helpers, and planets.
    pub scene: SceneConfig,
    /// Orbiting camera.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Ray-marching sample counts, baked into the atmosphere shader.
    pub samples: SampleCounts,
    /// How scattered light is combined with the scene.
    pub composite: CompositeMode,
    /// How the sun position turns into a light direction.
    pub sun_model: SunModel,
    /// Slices and stacks of the sphere mesh shared by planets and shells.
    pub sphere_segments: u32,
    /// Clear color of the opaque pass (linear RGBA).
    pub clear_color: [f64; 4],
}

/// Scene content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// World-space sun position.
    pub sun_position: [f32; 3],
    /// Draw a white sphere at the sun position.
    pub show_sun_marker: bool,
    /// Radius of the sun marker.
    pub sun_marker_radius: f32,
    /// Draw a circle in the XZ plane around the origin.
    pub show_orbit_line: bool,
    /// Radius of the orbit circle.
    pub orbit_line_radius: f32,
    /// Line segments in the orbit circle.
    pub orbit_line_segments: u32,
    /// Planets added at startup.
    pub planets: Vec<PlanetDesc>,
}

/// Construction parameters of one planet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetDesc {
    /// World-space center.
    pub center: [f32; 3],
    /// Surface radius.
    pub radius: f32,
    /// Optional surface texture (equirectangular image).
    pub texture: Option<PathBuf>,
    /// Atmosphere settings; `None` renders a bare planet.
    pub atmosphere: Option<AtmosphereOptions>,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Orbit distance from the origin.
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Orbit speed in radians per second (0 = static).
    pub orbit_speed: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Aurora".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples: SampleCounts::default(),
            composite: CompositeMode::default(),
            sun_model: SunModel::default(),
            sphere_segments: 30,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sun_position: [60.0, 0.0, 0.0],
            show_sun_marker: true,
            sun_marker_radius: 2.0,
            show_orbit_line: false,
            orbit_line_radius: 4.0,
            orbit_line_segments: 200,
            planets: vec![PlanetDesc {
                atmosphere: Some(AtmosphereOptions::default()),
                ..PlanetDesc::default()
            }],
        }
    }
}

impl Default for PlanetDesc {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0, 0.0],
            radius: 5.0,
            texture: None,
            atmosphere: None,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 20.0,
            fov_degrees: 45.0,
            orbit_speed: 0.1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info,wgpu=warn,naga=warn".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
