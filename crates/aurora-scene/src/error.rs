//! Scene-level errors.

use aurora_atmosphere::AtmosphereError;
use aurora_render::{TargetError, TextureError};

use crate::planet::PlanetId;

/// Errors raised by the scene compositor and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Atmosphere(#[from] AtmosphereError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("no planet with id {0}")]
    UnknownPlanet(PlanetId),
}
