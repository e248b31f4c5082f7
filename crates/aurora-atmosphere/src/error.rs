//! Validation and binding errors for atmosphere state.

/// Errors raised when atmosphere state would become invalid or unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AtmosphereError {
    #[error("planet radius must be finite and positive, got {0}")]
    InvalidPlanetRadius(f32),

    #[error("planet center must be finite, got {0:?}")]
    InvalidPlanetCenter([f32; 3]),

    #[error("atmosphere height must be finite and positive, got {0}")]
    InvalidAtmosphereHeight(f32),

    #[error("wavelength for channel {channel} must be finite and positive, got {value}")]
    InvalidWavelength { channel: usize, value: f32 },

    #[error("scattering strength must be finite and non-negative, got {0}")]
    InvalidStrength(f32),

    #[error("density falloff must be finite and non-negative, got {0}")]
    InvalidDensityFalloff(f32),

    #[error("sun position {0:?} gives no usable sun direction")]
    DegenerateSunDirection([f32; 3]),

    #[error("resolution must be non-zero, got {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("{name} sample count must be within {min}..={max}, got {value}")]
    InvalidSampleCount {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("atmosphere pipeline rejected by the device: {0}")]
    PipelineCreation(String),

    #[error("atmosphere has not been bound to frame buffers")]
    Unbound,

    #[error("atmosphere is bound to frame buffers #{bound}, current are #{current}")]
    StaleFrameBuffers { bound: u64, current: u64 },
}
