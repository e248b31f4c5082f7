//! Single-scattering planetary atmosphere.
//!
//! [`AtmosphereParameters`] holds validated per-planet state and derives the
//! wavelength scattering coefficients. [`ScatterShell`] is the CPU reference of
//! the ray marcher. [`AtmospherePipeline`] and [`AtmosphereRenderer`] draw the
//! shell as an overlay on top of an already presented scene.

pub mod error;
pub mod params;
pub mod renderer;
pub mod scatter;
pub mod shader;
pub mod uniform;

pub use error::AtmosphereError;
pub use params::{
    AtmosphereOptions, AtmosphereParameters, CompositeMode, DEFAULT_SUN_POSITION, PlanetInfo,
    REFERENCE_WAVELENGTH, SunModel, scattering_coefficients,
};
pub use renderer::{AtmospherePipeline, AtmosphereRenderer};
pub use scatter::{
    ENTRY_EPSILON, FLT_MAX, PixelScatter, RayHit, SampleCounts, ScatterShell, ray_sphere,
};
pub use shader::{ATMOSPHERE_SHADER_BODY, atmosphere_shader_source};
pub use uniform::AtmosphereUniform;
