//! Camera that circles the origin in the XZ plane.

use aurora_config::CameraConfig;
use aurora_render::Camera;
use glam::Vec3;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    distance: f32,
    /// Radians per second.
    speed: f32,
    angle: f32,
    camera: Camera,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let distance = config.distance.max(f32::EPSILON);
        let mut camera = Camera::look_at(Vec3::new(distance, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
        camera.fov_y = config.fov_degrees.to_radians();
        Self {
            distance,
            speed: config.orbit_speed,
            angle: 0.0,
            camera,
        }
    }

    /// Advance the orbit by `dt` seconds and re-aim at the origin.
    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + dt * self.speed).rem_euclid(std::f32::consts::TAU);
        self.camera.position = Vec3::new(
            self.angle.cos() * self.distance,
            0.0,
            self.angle.sin() * self.distance,
        );
        self.camera.point_at(Vec3::ZERO, Vec3::Y);
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.camera.set_aspect_ratio(width as f32, height as f32);
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CameraConfig {
        CameraConfig {
            distance: 20.0,
            fov_degrees: 45.0,
            orbit_speed: 0.5,
        }
    }

    #[test]
    fn test_starts_on_positive_x() {
        let orbit = OrbitCamera::new(&config());
        assert_eq!(orbit.camera().position, Vec3::new(20.0, 0.0, 0.0));
        assert!((orbit.camera().fov_y - 45f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_advance_keeps_distance_and_faces_origin() {
        let mut orbit = OrbitCamera::new(&config());
        for _ in 0..10 {
            orbit.advance(0.3);
            let camera = orbit.camera();
            assert!((camera.position.length() - 20.0).abs() < 1e-3);
            let to_origin = (-camera.position).normalize();
            assert!(camera.forward().dot(to_origin) > 0.999);
        }
        assert!((orbit.angle() - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_zero_height_keeps_aspect() {
        let mut orbit = OrbitCamera::new(&config());
        orbit.set_aspect_ratio(800, 400);
        assert!((orbit.camera().aspect_ratio - 2.0).abs() < 1e-6);
        orbit.set_aspect_ratio(800, 0);
        assert!((orbit.camera().aspect_ratio - 2.0).abs() < 1e-6);
    }
}
