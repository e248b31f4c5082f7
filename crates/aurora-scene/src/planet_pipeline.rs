//! Textured, sun-lit planet surface pipeline.

use aurora_render::{DepthBuffer, MeshBuffer, VertexPositionNormalUv};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::num::NonZeroU64;

/// Light reaching the night side.
pub const AMBIENT_LIGHT: f32 = 0.05;

/// Per-planet placement and lighting, bound at group 2.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PlanetUniform {
    /// Unit sphere to world: translate to the center, scale by the radius.
    pub model: [[f32; 4]; 4],
    /// Unit direction toward the sun.
    pub sun_direction: [f32; 3],
    pub ambient: f32,
}

static_assertions::assert_eq_size!(PlanetUniform, [u8; 80]);

impl PlanetUniform {
    pub fn new(center: Vec3, radius: f32, sun_direction: Vec3) -> Self {
        let model = Mat4::from_translation(center) * Mat4::from_scale(Vec3::splat(radius));
        Self {
            model: model.to_cols_array_2d(),
            sun_direction: sun_direction.to_array(),
            ambient: AMBIENT_LIGHT,
        }
    }
}

/// Layout of the [`PlanetUniform`] group.
pub fn planet_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("planet-bind-group-layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<PlanetUniform>() as u64),
            },
            count: None,
        }],
    })
}

/// Draws planets: camera at group 0, surface texture at group 1, planet uniform at group 2.
pub struct PlanetPipeline {
    pipeline: wgpu::RenderPipeline,
    planet_layout: wgpu::BindGroupLayout,
}

impl PlanetPipeline {
    pub fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planet-shader"),
            source: wgpu::ShaderSource::Wgsl(PLANET_SHADER_SOURCE.into()),
        });

        let planet_layout = planet_bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("planet-pipeline-layout"),
            bind_group_layouts: &[camera_layout, texture_layout, &planet_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("planet-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::depth_stencil_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            planet_layout,
        }
    }

    pub fn planet_layout(&self) -> &wgpu::BindGroupLayout {
        &self.planet_layout
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera_bind_group: &wgpu::BindGroup,
        texture_bind_group: &wgpu::BindGroup,
        planet_bind_group: &wgpu::BindGroup,
        mesh: &MeshBuffer,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, texture_bind_group, &[]);
        pass.set_bind_group(2, planet_bind_group, &[]);
        mesh.draw(pass);
    }
}

/// The WGSL source code for the planet surface shader.
pub const PLANET_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct PlanetUniform {
    model: mat4x4<f32>,
    sun_direction: vec3<f32>,
    ambient: f32,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(1) @binding(0) var surface_texture: texture_2d<f32>;
@group(1) @binding(1) var surface_sampler: sampler;
@group(2) @binding(0) var<uniform> planet: PlanetUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = planet.model * vec4<f32>(in.position, 1.0);
    out.clip_position = camera.view_proj * world;
    // Uniform scale: the unit-sphere normal is already the world normal.
    out.normal = in.normal;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(surface_texture, surface_sampler, in.uv).rgb;
    let diffuse = max(dot(normalize(in.normal), planet.sun_direction), 0.0);
    let light = min(diffuse + planet.ambient, 1.0);
    return vec4<f32>(albedo * light, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_matrix_places_unit_sphere() {
        let uniform = PlanetUniform::new(Vec3::new(10.0, 0.0, 0.0), 2.0, Vec3::X);
        let model = Mat4::from_cols_array_2d(&uniform.model);
        let top = model.transform_point3(Vec3::Y);
        assert!((top - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-6);
        assert_eq!(uniform.ambient, AMBIENT_LIGHT);
    }

    #[test]
    fn test_shader_binds_three_groups() {
        assert!(PLANET_SHADER_SOURCE.contains("@group(0)"));
        assert!(PLANET_SHADER_SOURCE.contains("@group(1) @binding(1)"));
        assert!(PLANET_SHADER_SOURCE.contains("@group(2)"));
    }
}
