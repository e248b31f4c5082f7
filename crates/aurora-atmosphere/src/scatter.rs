//! CPU reference of the single-scattering ray marcher.
//!
//! Every routine here mirrors a function in `atmosphere.wgsl` one to one, so
//! the GPU output can be reasoned about (and tested) on the CPU.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::AtmosphereError;
use crate::params::CompositeMode;

/// Sentinel distance returned for rays that miss a sphere.
pub const FLT_MAX: f32 = 10_000.0;

/// Offset applied past the atmosphere entry point (and trimmed from the far end).
pub const ENTRY_EPSILON: f32 = 1e-4;

/// Result of a ray–sphere test: distance to the entry point and length inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub near: f32,
    pub inside: f32,
}

impl RayHit {
    pub const MISS: RayHit = RayHit {
        near: FLT_MAX,
        inside: 0.0,
    };

    /// Tangent hits have zero length and no visible segment.
    pub fn has_segment(&self) -> bool {
        self.inside > 0.0
    }
}

/// Intersect a ray (unit `dir`) with a sphere.
///
/// The entry distance is clamped to 0 when the origin is inside the sphere.
/// Spheres entirely behind the ray count as misses.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> RayHit {
    let offset = origin - center;
    let b = 2.0 * offset.dot(dir);
    let c = offset.dot(offset) - radius * radius;
    let discriminant = b * b - 4.0 * c;
    if discriminant < 0.0 {
        return RayHit::MISS;
    }

    let s = discriminant.sqrt();
    let near = ((-b - s) * 0.5).max(0.0);
    let far = (-b + s) * 0.5;
    if far < 0.0 {
        return RayHit::MISS;
    }
    RayHit {
        near,
        inside: far - near,
    }
}

/// Number of samples taken by the two nested integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleCounts {
    /// Samples along the view ray.
    pub scatter_points: u32,
    /// Samples along each optical depth integral.
    pub optical_depth_points: u32,
}

impl SampleCounts {
    /// Both endpoints are sampled, so fewer than two points has no step size.
    pub const MIN: u32 = 2;
    pub const MAX: u32 = 32;

    pub fn validate(&self) -> Result<(), AtmosphereError> {
        for (name, value) in [
            ("scatter", self.scatter_points),
            ("optical depth", self.optical_depth_points),
        ] {
            if !(Self::MIN..=Self::MAX).contains(&value) {
                return Err(AtmosphereError::InvalidSampleCount {
                    name,
                    value,
                    min: Self::MIN,
                    max: Self::MAX,
                });
            }
        }
        Ok(())
    }
}

impl Default for SampleCounts {
    fn default() -> Self {
        Self {
            scatter_points: 5,
            optical_depth_points: 5,
        }
    }
}

/// Scattered light and remaining scene transmittance for one view ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScatter {
    pub light: Vec3,
    pub transmittance: Vec3,
}

impl PixelScatter {
    /// Color emitted by the overlay fragment: the light at full opacity,
    /// or transparent black when the ray has no segment in the shell.
    pub fn overlay_color(scatter: Option<PixelScatter>) -> Vec4 {
        match scatter {
            Some(scatter) => scatter.light.extend(1.0),
            None => Vec4::ZERO,
        }
    }

    /// Color emitted by the dimming fragment: the view transmittance, or
    /// white when the ray has no segment in the shell.
    pub fn transmittance_color(scatter: Option<PixelScatter>) -> Vec4 {
        match scatter {
            Some(scatter) => scatter.transmittance.extend(1.0),
            None => Vec4::ONE,
        }
    }

    /// `dst` after this shell's draws: dimmed first in attenuate mode, then
    /// the scattered light added on top.
    pub fn blend_onto(scatter: Option<PixelScatter>, dst: Vec3, mode: CompositeMode) -> Vec3 {
        let dimmed = match mode {
            CompositeMode::Additive => dst,
            CompositeMode::Attenuate => dst * Self::transmittance_color(scatter).truncate(),
        };
        dimmed + Self::overlay_color(scatter).truncate()
    }
}

/// The uniform-level view of one atmosphere shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterShell {
    pub planet_center: Vec3,
    pub planet_radius: f32,
    pub atmosphere_radius: f32,
    pub density_falloff: f32,
    pub scatter_coefficients: Vec3,
    /// Unit vector toward the sun.
    pub sun_direction: Vec3,
}

impl ScatterShell {
    /// Relative density at `point`: 1 at the surface, 0 at the outer radius.
    ///
    /// Points above the shell yield negative values; callers keep samples inside.
    pub fn density_at_point(&self, point: Vec3) -> f32 {
        let height = (point - self.planet_center).length() - self.planet_radius;
        let h01 = height / (self.atmosphere_radius - self.planet_radius);
        (-h01 * self.density_falloff).exp() * (1.0 - h01)
    }

    /// Riemann sum of density over `points` samples, both endpoints included.
    pub fn optical_depth(&self, origin: Vec3, dir: Vec3, length: f32, points: u32) -> f32 {
        let step = length / (points - 1) as f32;
        let mut sample = origin;
        let mut depth = 0.0;
        for _ in 0..points {
            depth += self.density_at_point(sample) * step;
            sample += dir * step;
        }
        depth
    }

    /// Light scattered toward the viewer along `length` units of the view ray.
    pub fn in_scattered_light(
        &self,
        origin: Vec3,
        dir: Vec3,
        length: f32,
        counts: SampleCounts,
    ) -> Vec3 {
        let step = length / (counts.scatter_points - 1) as f32;
        let mut sample = origin;
        let mut light = Vec3::ZERO;

        for i in 0..counts.scatter_points {
            let sun_ray = ray_sphere(
                sample,
                self.sun_direction,
                self.planet_center,
                self.atmosphere_radius,
            );
            let sun_depth = self.optical_depth(
                sample,
                self.sun_direction,
                sun_ray.inside,
                counts.optical_depth_points,
            );
            let view_depth =
                self.optical_depth(sample, -dir, step * i as f32, counts.optical_depth_points);
            let transmittance = self.attenuate(sun_depth + view_depth);

            light += self.density_at_point(sample) * step * transmittance * self.scatter_coefficients;
            sample += dir * step;
        }
        light
    }

    /// Fraction of light surviving the full view segment, per channel.
    pub fn view_transmittance(&self, origin: Vec3, dir: Vec3, length: f32, points: u32) -> Vec3 {
        self.attenuate(self.optical_depth(origin, dir, length, points))
    }

    /// Shade one view ray.
    ///
    /// `scene_distance` is the distance to the nearest opaque surface along
    /// the ray ([`FLT_MAX`] when none). Returns `None` when the ray has no
    /// visible segment inside the shell, or when `dir` is degenerate.
    pub fn shade_pixel(
        &self,
        ray_origin: Vec3,
        ray_dir: Vec3,
        scene_distance: f32,
        counts: SampleCounts,
    ) -> Option<PixelScatter> {
        let dir = ray_dir.try_normalize()?;
        let planet = ray_sphere(ray_origin, dir, self.planet_center, self.planet_radius);
        let shell = ray_sphere(ray_origin, dir, self.planet_center, self.atmosphere_radius);

        let surface = planet.near.min(scene_distance);
        let through = shell.inside.min(surface - shell.near);
        if through <= 0.0 {
            return None;
        }

        let start = ray_origin + dir * (shell.near + ENTRY_EPSILON);
        let length = through - ENTRY_EPSILON * 2.0;
        Some(PixelScatter {
            light: self.in_scattered_light(start, dir, length, counts),
            transmittance: self.view_transmittance(start, dir, length, counts.optical_depth_points),
        })
    }

    fn attenuate(&self, optical_depth: f32) -> Vec3 {
        (-optical_depth * self.scatter_coefficients).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> ScatterShell {
        ScatterShell {
            planet_center: Vec3::ZERO,
            planet_radius: 5.0,
            atmosphere_radius: 5.0 + 0.3,
            density_falloff: 5.0,
            scatter_coefficients: Vec3::new(1.066, 3.244, 6.830),
            sun_direction: Vec3::X,
        }
    }

    #[test]
    fn test_ray_sphere_miss_returns_sentinel() {
        let hit = ray_sphere(Vec3::new(0.0, 10.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert_eq!(hit, RayHit::MISS);
        assert_eq!(hit.near, FLT_MAX);
        assert_eq!(hit.inside, 0.0);
    }

    #[test]
    fn test_ray_sphere_behind_ray_is_miss() {
        let hit = ray_sphere(Vec3::new(10.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert_eq!(hit, RayHit::MISS);
    }

    #[test]
    fn test_ray_sphere_tangent_has_zero_length() {
        let hit = ray_sphere(Vec3::new(-10.0, 1.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert!((hit.near - 10.0).abs() < 1e-4);
        assert_eq!(hit.inside, 0.0);
        assert!(!hit.has_segment());
    }

    #[test]
    fn test_ray_sphere_through_center_is_symmetric() {
        let camera_distance = 7.5;
        let hit = ray_sphere(
            Vec3::new(camera_distance, 0.0, 0.0),
            Vec3::NEG_X,
            Vec3::ZERO,
            1.0,
        );
        assert!((hit.near - (camera_distance - 1.0)).abs() < 1e-5);
        assert!((hit.inside - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_from_inside_starts_at_zero() {
        let hit = ray_sphere(Vec3::ZERO, Vec3::Y, Vec3::ZERO, 3.0);
        assert_eq!(hit.near, 0.0);
        assert!((hit.inside - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_density_is_one_at_surface() {
        for falloff in [0.0, 1.0, 5.0, 10.0] {
            let s = ScatterShell {
                density_falloff: falloff,
                ..shell()
            };
            assert_eq!(s.density_at_point(Vec3::new(5.0, 0.0, 0.0)), 1.0);
        }
    }

    #[test]
    fn test_density_is_zero_at_outer_boundary() {
        for falloff in [0.0, 1.0, 5.0, 10.0] {
            let s = ScatterShell {
                density_falloff: falloff,
                ..shell()
            };
            let boundary = Vec3::new(s.atmosphere_radius, 0.0, 0.0);
            assert!(s.density_at_point(boundary).abs() < 1e-6);
        }
    }

    #[test]
    fn test_density_above_shell_is_negative() {
        let s = shell();
        assert!(s.density_at_point(Vec3::new(6.0, 0.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_optical_depth_includes_both_endpoints() {
        // A zero direction keeps all 5 samples on the surface (density 1);
        // length 1 gives a step of 0.25, so the sum is 1.25.
        let s = shell();
        let depth = s.optical_depth(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, 1.0, 5);
        assert!((depth - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_optical_depth_zero_length_is_zero() {
        let s = shell();
        assert_eq!(s.optical_depth(Vec3::new(5.1, 0.0, 0.0), Vec3::X, 0.0, 4), 0.0);
    }

    #[test]
    fn test_in_scattered_light_is_positive_inside_shell() {
        let s = shell();
        let light = s.in_scattered_light(
            Vec3::new(5.25, 0.0, 0.0),
            Vec3::NEG_X,
            0.2,
            SampleCounts::default(),
        );
        assert!(light.min_element() > 0.0);
        // Blue scatters most strongly over short paths.
        assert!(light.z > light.x);
    }

    #[test]
    fn test_shade_pixel_misses_outside_silhouette() {
        let s = shell();
        let scatter = s.shade_pixel(
            Vec3::new(20.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.5, 0.0),
            FLT_MAX,
            SampleCounts::default(),
        );
        assert!(scatter.is_none());
        assert_eq!(PixelScatter::overlay_color(scatter), Vec4::ZERO);
    }

    #[test]
    fn test_shade_pixel_stops_at_planet_surface() {
        let s = shell();
        let counts = SampleCounts::default();
        let origin = Vec3::new(20.0, 0.0, 0.0);
        let scatter = s.shade_pixel(origin, Vec3::NEG_X, FLT_MAX, counts).unwrap();
        let direct = s.in_scattered_light(
            Vec3::new(5.3 - ENTRY_EPSILON, 0.0, 0.0),
            Vec3::NEG_X,
            0.3 - 2.0 * ENTRY_EPSILON,
            counts,
        );
        assert!((scatter.light - direct).length() < 1e-3);
    }

    #[test]
    fn test_shade_pixel_clipped_by_nearer_geometry() {
        let s = shell();
        let counts = SampleCounts::default();
        let origin = Vec3::new(20.0, 0.0, 0.0);
        // An occluder in front of the shell hides the atmosphere entirely.
        assert!(s.shade_pixel(origin, Vec3::NEG_X, 10.0, counts).is_none());
        // One halfway into the shell shortens the march.
        let full = s.shade_pixel(origin, Vec3::NEG_X, FLT_MAX, counts).unwrap();
        let half = s.shade_pixel(origin, Vec3::NEG_X, 14.85, counts).unwrap();
        assert!(half.light.z < full.light.z);
    }

    #[test]
    fn test_shade_pixel_rejects_degenerate_direction() {
        let s = shell();
        assert!(
            s.shade_pixel(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO, FLT_MAX, SampleCounts::default())
                .is_none()
        );
    }

    #[test]
    fn test_tangent_ray_has_no_visible_segment() {
        // Radii chosen to be exact in f32 so the discriminant is exactly zero.
        let s = ScatterShell {
            atmosphere_radius: 5.5,
            ..shell()
        };
        let origin = Vec3::new(20.0, 5.5, 0.0);
        assert!(
            s.shade_pixel(origin, Vec3::NEG_X, FLT_MAX, SampleCounts::default())
                .is_none()
        );
    }

    #[test]
    fn test_transmittance_within_unit_range() {
        let s = shell();
        let scatter = s
            .shade_pixel(
                Vec3::new(20.0, 0.0, 0.0),
                Vec3::NEG_X,
                FLT_MAX,
                SampleCounts::default(),
            )
            .unwrap();
        for t in scatter.transmittance.to_array() {
            assert!(t > 0.0 && t <= 1.0);
        }
        assert!(scatter.transmittance.z < scatter.transmittance.x);
    }

    #[test]
    fn test_sample_count_validation() {
        assert!(SampleCounts::default().validate().is_ok());
        let too_few = SampleCounts {
            scatter_points: 1,
            ..SampleCounts::default()
        };
        assert!(matches!(
            too_few.validate(),
            Err(AtmosphereError::InvalidSampleCount { value: 1, .. })
        ));
        let too_many = SampleCounts {
            optical_depth_points: 33,
            ..SampleCounts::default()
        };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_overlapping_shells_keep_both_contributions() {
        // The view ray passes through the upper air of the near shell, then
        // straight into the far planet behind it.
        let near = ScatterShell {
            planet_center: Vec3::new(0.0, 5.15, 0.0),
            ..shell()
        };
        let far = ScatterShell {
            planet_center: Vec3::new(-30.0, 0.0, 0.0),
            ..shell()
        };
        let origin = Vec3::new(20.0, 0.0, 0.0);
        let counts = SampleCounts::default();

        let far_hit = far.shade_pixel(origin, Vec3::NEG_X, FLT_MAX, counts);
        let near_hit = near.shade_pixel(origin, Vec3::NEG_X, FLT_MAX, counts);
        assert!(far_hit.is_some());
        assert!(near_hit.is_some());

        let scene = Vec3::splat(0.25);
        for mode in [CompositeMode::Additive, CompositeMode::Attenuate] {
            let after_far = PixelScatter::blend_onto(far_hit, scene, mode);
            let after_both = PixelScatter::blend_onto(near_hit, after_far, mode);
            let near_alone = PixelScatter::blend_onto(near_hit, scene, mode);
            assert!(
                after_both.cmpgt(near_alone).all(),
                "{mode}: far shell light was lost ({after_both} vs {near_alone})"
            );
        }
    }

    #[test]
    fn test_miss_leaves_destination_untouched() {
        let scene = Vec3::new(0.1, 0.2, 0.3);
        for mode in [CompositeMode::Additive, CompositeMode::Attenuate] {
            assert_eq!(PixelScatter::blend_onto(None, scene, mode), scene);
        }
        assert_eq!(PixelScatter::transmittance_color(None), Vec4::ONE);
    }

    #[test]
    fn test_attenuate_blend_dims_then_adds() {
        let scatter = PixelScatter {
            light: Vec3::new(0.1, 0.2, 0.3),
            transmittance: Vec3::new(0.5, 0.5, 0.25),
        };
        let dst = Vec3::splat(0.8);
        assert_eq!(
            PixelScatter::blend_onto(Some(scatter), dst, CompositeMode::Attenuate),
            dst * scatter.transmittance + scatter.light
        );
        assert_eq!(
            PixelScatter::blend_onto(Some(scatter), dst, CompositeMode::Additive),
            dst + scatter.light
        );
    }
}
