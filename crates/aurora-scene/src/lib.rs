//! Planetary scene: planets, sun helpers, texture loading, and the
//! three-pass compositor that layers atmospheres over the opaque scene.

pub mod compositor;
pub mod error;
pub mod planet;
pub mod planet_pipeline;
pub mod sun;
pub mod textures;

pub use compositor::{CompositorSettings, SceneCompositor};
pub use error::SceneError;
pub use planet::{Planet, PlanetId};
pub use planet_pipeline::{AMBIENT_LIGHT, PLANET_SHADER_SOURCE, PlanetPipeline, PlanetUniform};
pub use sun::{OrbitLine, SunMarker, orbit_circle};
pub use textures::{DecodedImage, LoadedTexture, TextureLoadError, TextureLoader, decode_texture};
