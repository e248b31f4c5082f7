use crate::scatter::{FLT_MAX, SampleCounts};

/// Ray-marching body of the atmosphere shader. Needs the constants from
/// [`atmosphere_shader_source`] prepended before it compiles.
pub const ATMOSPHERE_SHADER_BODY: &str = include_str!("atmosphere.wgsl");

/// Full WGSL source with the sample counts baked in as constants.
pub fn atmosphere_shader_source(counts: SampleCounts) -> String {
    format!(
        "const FLT_MAX: f32 = {FLT_MAX:.1};\n\
         const SCATTER_POINT_COUNT: i32 = {};\n\
         const OPTICAL_DEPTH_POINT_COUNT: i32 = {};\n\n{ATMOSPHERE_SHADER_BODY}",
        counts.scatter_points, counts.optical_depth_points,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_baked_in() {
        let source = atmosphere_shader_source(SampleCounts {
            scatter_points: 7,
            optical_depth_points: 3,
        });
        assert!(source.contains("const SCATTER_POINT_COUNT: i32 = 7;"));
        assert!(source.contains("const OPTICAL_DEPTH_POINT_COUNT: i32 = 3;"));
        assert!(source.contains("const FLT_MAX: f32 = 10000.0;"));
    }

    #[test]
    fn test_body_declares_entry_points() {
        assert!(ATMOSPHERE_SHADER_BODY.contains("fn vs_atmosphere"));
        assert!(ATMOSPHERE_SHADER_BODY.contains("fn fs_atmosphere"));
        assert!(ATMOSPHERE_SHADER_BODY.contains("fn fs_transmittance"));
        assert!(!ATMOSPHERE_SHADER_BODY.contains("texture_depth_2d"));
        assert!(!ATMOSPHERE_SHADER_BODY.contains("const SCATTER_POINT_COUNT"));
    }
}
