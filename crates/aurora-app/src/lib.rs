//! Aurora viewer: a window that orbits a camera around atmospheric planets.

pub mod orbit;
pub mod window;

pub use orbit::OrbitCamera;
pub use window::{AppState, run_with_config, window_attributes_from_config};
