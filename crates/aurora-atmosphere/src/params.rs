//! CPU-side atmosphere state: validated parameters with eagerly derived coefficients.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aurora_render::Camera;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::AtmosphereError;
use crate::scatter::ScatterShell;
use crate::uniform::AtmosphereUniform;

/// Wavelength that maps to a coefficient equal to the strength.
pub const REFERENCE_WAVELENGTH: f32 = 400.0;

/// Sun position used until the scene sets one.
pub const DEFAULT_SUN_POSITION: Vec3 = Vec3::X;

/// Squared length below which a sun offset has no usable direction.
const MIN_SUN_OFFSET_SQUARED: f32 = 1e-12;

/// Placement of a planet, shared read-only with its atmosphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetInfo {
    center: Vec3,
    radius: f32,
}

impl PlanetInfo {
    pub fn new(center: Vec3, radius: f32) -> Result<Self, AtmosphereError> {
        if !center.is_finite() {
            return Err(AtmosphereError::InvalidPlanetCenter(center.to_array()));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(AtmosphereError::InvalidPlanetRadius(radius));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// User-facing atmosphere options, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereOptions {
    /// Shell thickness above the surface.
    pub atmosphere_height: f32,
    /// Multiplier applied to every scattering coefficient.
    pub strength: f32,
    /// Exponential density decay with altitude.
    pub density_falloff: f32,
    /// Effective red, green, and blue wavelengths.
    pub scatter_rgb: [f32; 3],
}

impl Default for AtmosphereOptions {
    fn default() -> Self {
        Self {
            atmosphere_height: 0.3,
            strength: 10.0,
            density_falloff: 5.0,
            scatter_rgb: [700.0, 530.0, 440.0],
        }
    }
}

/// How the sun position turns into a light direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SunModel {
    /// Sun at infinity: every planet sees `normalize(sun_position)`.
    #[default]
    Directional,
    /// Sun at a point: each planet sees `normalize(sun_position - center)`.
    Positional,
}

impl SunModel {
    /// Unit direction toward the sun as seen from `planet_center`, if one exists.
    pub fn direction(self, sun_position: Vec3, planet_center: Vec3) -> Option<Vec3> {
        let offset = match self {
            SunModel::Directional => sun_position,
            SunModel::Positional => sun_position - planet_center,
        };
        if !offset.is_finite() || offset.length_squared() < MIN_SUN_OFFSET_SQUARED {
            return None;
        }
        Some(offset.normalize())
    }
}

/// How scattered light is combined with the already presented scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Scattered light is added on top of the scene.
    #[default]
    Additive,
    /// The scene behind the shell is dimmed by the view transmittance first.
    Attenuate,
}

impl FromStr for CompositeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "additive" => Ok(CompositeMode::Additive),
            "attenuate" => Ok(CompositeMode::Attenuate),
            other => Err(format!(
                "unknown composite mode '{other}' (expected 'additive' or 'attenuate')"
            )),
        }
    }
}

impl fmt::Display for CompositeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeMode::Additive => f.write_str("additive"),
            CompositeMode::Attenuate => f.write_str("attenuate"),
        }
    }
}

/// Derive `(400 / λ)^4 * strength` per channel.
pub fn scattering_coefficients(wavelengths: [f32; 3], strength: f32) -> Result<Vec3, AtmosphereError> {
    validate_wavelengths(wavelengths)?;
    validate_strength(strength)?;
    Ok(Vec3::from_array(
        wavelengths.map(|lambda| (REFERENCE_WAVELENGTH / lambda).powi(4) * strength),
    ))
}

fn validate_wavelengths(wavelengths: [f32; 3]) -> Result<(), AtmosphereError> {
    match wavelengths
        .iter()
        .enumerate()
        .find(|(_, value)| !(value.is_finite() && **value > 0.0))
    {
        Some((channel, &value)) => Err(AtmosphereError::InvalidWavelength { channel, value }),
        None => Ok(()),
    }
}

fn validate_strength(strength: f32) -> Result<(), AtmosphereError> {
    if strength.is_finite() && strength >= 0.0 {
        Ok(())
    } else {
        Err(AtmosphereError::InvalidStrength(strength))
    }
}

fn validate_density_falloff(falloff: f32) -> Result<(), AtmosphereError> {
    if falloff.is_finite() && falloff >= 0.0 {
        Ok(())
    } else {
        Err(AtmosphereError::InvalidDensityFalloff(falloff))
    }
}

/// Atmosphere state for one planet.
///
/// Every mutator validates first and only then writes, so a rejected update
/// leaves the previous state untouched. Derived coefficients are recomputed
/// inside the mutator that changes their inputs.
#[derive(Debug, Clone)]
pub struct AtmosphereParameters {
    planet: Arc<PlanetInfo>,
    atmosphere_height: f32,
    density_falloff: f32,
    wavelengths: [f32; 3],
    strength: f32,
    scatter_coefficients: Vec3,
    sun_model: SunModel,
    sun_position: Vec3,
    sun_direction: Vec3,
    resolution: [u32; 2],
}

impl AtmosphereParameters {
    pub fn new(
        planet: Arc<PlanetInfo>,
        options: &AtmosphereOptions,
        sun_model: SunModel,
    ) -> Result<Self, AtmosphereError> {
        let height = options.atmosphere_height;
        if !(height.is_finite() && height > 0.0) {
            return Err(AtmosphereError::InvalidAtmosphereHeight(height));
        }
        validate_density_falloff(options.density_falloff)?;
        let scatter_coefficients = scattering_coefficients(options.scatter_rgb, options.strength)?;
        let sun_direction = sun_model
            .direction(DEFAULT_SUN_POSITION, planet.center())
            .ok_or(AtmosphereError::DegenerateSunDirection(
                DEFAULT_SUN_POSITION.to_array(),
            ))?;

        Ok(Self {
            planet,
            atmosphere_height: height,
            density_falloff: options.density_falloff,
            wavelengths: options.scatter_rgb,
            strength: options.strength,
            scatter_coefficients,
            sun_model,
            sun_position: DEFAULT_SUN_POSITION,
            sun_direction,
            resolution: [1, 1],
        })
    }

    pub fn planet(&self) -> &PlanetInfo {
        &self.planet
    }

    pub fn atmosphere_height(&self) -> f32 {
        self.atmosphere_height
    }

    pub fn atmosphere_radius(&self) -> f32 {
        self.planet.radius() + self.atmosphere_height
    }

    pub fn density_falloff(&self) -> f32 {
        self.density_falloff
    }

    pub fn wavelengths(&self) -> [f32; 3] {
        self.wavelengths
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn scatter_coefficients(&self) -> Vec3 {
        self.scatter_coefficients
    }

    pub fn sun_model(&self) -> SunModel {
        self.sun_model
    }

    pub fn sun_position(&self) -> Vec3 {
        self.sun_position
    }

    pub fn sun_direction(&self) -> Vec3 {
        self.sun_direction
    }

    pub fn resolution(&self) -> [u32; 2] {
        self.resolution
    }

    pub fn set_scatter_rgb(&mut self, wavelengths: [f32; 3]) -> Result<(), AtmosphereError> {
        self.scatter_coefficients = scattering_coefficients(wavelengths, self.strength)?;
        self.wavelengths = wavelengths;
        Ok(())
    }

    pub fn set_strength(&mut self, strength: f32) -> Result<(), AtmosphereError> {
        self.scatter_coefficients = scattering_coefficients(self.wavelengths, strength)?;
        self.strength = strength;
        Ok(())
    }

    pub fn set_density_falloff(&mut self, falloff: f32) -> Result<(), AtmosphereError> {
        validate_density_falloff(falloff)?;
        self.density_falloff = falloff;
        Ok(())
    }

    /// Check that `position` yields a sun direction for this planet without storing it.
    pub fn check_sun_position(&self, position: Vec3) -> Result<Vec3, AtmosphereError> {
        self.sun_model
            .direction(position, self.planet.center())
            .ok_or(AtmosphereError::DegenerateSunDirection(position.to_array()))
    }

    pub fn set_sun_position(&mut self, position: Vec3) -> Result<(), AtmosphereError> {
        self.sun_direction = self.check_sun_position(position)?;
        self.sun_position = position;
        Ok(())
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), AtmosphereError> {
        if width == 0 || height == 0 {
            return Err(AtmosphereError::InvalidResolution { width, height });
        }
        self.resolution = [width, height];
        Ok(())
    }

    /// Snapshot of the values the ray marcher consumes.
    pub fn shell(&self) -> ScatterShell {
        ScatterShell {
            planet_center: self.planet.center(),
            planet_radius: self.planet.radius(),
            atmosphere_radius: self.atmosphere_radius(),
            density_falloff: self.density_falloff,
            scatter_coefficients: self.scatter_coefficients,
            sun_direction: self.sun_direction,
        }
    }

    /// Pack the uniform block for this frame.
    pub fn to_uniform(&self, camera: &Camera) -> AtmosphereUniform {
        let view_proj = camera.view_projection_matrix();
        AtmosphereUniform {
            planet_center: self.planet.center().to_array(),
            planet_radius: self.planet.radius(),
            sun_direction: self.sun_direction.to_array(),
            atmosphere_radius: self.atmosphere_radius(),
            scatter_coefficients: self.scatter_coefficients.to_array(),
            density_falloff: self.density_falloff,
            camera_position: camera.position.to_array(),
            _pad0: 0.0,
            resolution: self.resolution.map(|v| v as f32),
            _pad: [0.0; 2],
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
        }
    }
}
