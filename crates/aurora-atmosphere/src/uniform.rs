use bytemuck::{Pod, Zeroable};

/// GPU-side atmosphere uniform buffer. Matches `AtmosphereUniform` in `atmosphere.wgsl`.
///
/// Each vec3 is followed by a scalar so every vec3 starts on a 16-byte boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct AtmosphereUniform {
    /// Planet center in world space. (offset 0)
    pub planet_center: [f32; 3],
    /// Planet surface radius. (offset 12)
    pub planet_radius: f32,
    /// Unit direction toward the sun. (offset 16)
    pub sun_direction: [f32; 3],
    /// Planet radius plus atmosphere height. (offset 28)
    pub atmosphere_radius: f32,
    /// Per-channel scattering coefficients. (offset 32)
    pub scatter_coefficients: [f32; 3],
    /// (offset 44)
    pub density_falloff: f32,
    /// Camera position in world space. (offset 48)
    pub camera_position: [f32; 3],
    /// (offset 60)
    pub _pad0: f32,
    /// Frame buffer size in pixels. (offset 64)
    pub resolution: [f32; 2],
    /// Padding for 16-byte alignment before mat4. (offset 72)
    pub _pad: [f32; 2],
    /// View-projection matrix (column-major). (offset 80)
    pub view_proj: [[f32; 4]; 4],
    /// Inverse view-projection matrix (column-major). (offset 144)
    pub inv_view_proj: [[f32; 4]; 4],
}

static_assertions::assert_eq_size!(AtmosphereUniform, [u8; 208]);
