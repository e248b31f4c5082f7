//! GPU-side atmosphere: the shared overlay pipeline and per-planet renderers.

use aurora_render::{Camera, MeshBuffer, OffscreenTarget, VertexPositionNormalUv};

use crate::error::AtmosphereError;
use crate::params::{AtmosphereParameters, CompositeMode};
use crate::scatter::SampleCounts;
use crate::shader::atmosphere_shader_source;
use crate::uniform::AtmosphereUniform;

/// Overlay pipelines shared by every atmosphere drawn into the same output format.
///
/// The light pipeline adds in-scattered light. In [`CompositeMode::Attenuate`]
/// a dimming pipeline runs first and multiplies whatever is already on screen
/// by the view transmittance, so overlapping shells compose instead of
/// overwriting one another.
pub struct AtmospherePipeline {
    light: wgpu::RenderPipeline,
    dimming: Option<wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    counts: SampleCounts,
    mode: CompositeMode,
}

/// Scattered light is added on top of the destination.
const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::OVER,
};

/// The destination is scaled per channel by the fragment color; alpha is kept.
const MULTIPLY_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::Src,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

impl AtmospherePipeline {
    /// Compile the overlay shader and build its pipelines.
    ///
    /// Shader or pipeline validation failures from the backend are returned
    /// as [`AtmosphereError::PipelineCreation`].
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        counts: SampleCounts,
        mode: CompositeMode,
    ) -> Result<Self, AtmosphereError> {
        counts.validate()?;

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("atmosphere-shader"),
            source: wgpu::ShaderSource::Wgsl(atmosphere_shader_source(counts).into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atmosphere-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Depth32Float read as an unfilterable float texture.
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("atmosphere-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let build = |label: &'static str, entry_point: &'static str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_atmosphere"),
                    buffers: &[VertexPositionNormalUv::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                // Back faces only: one fragment per covered pixel, camera inside or out.
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Front),
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: output_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let light = build("atmosphere-light-pipeline", "fs_atmosphere", ADDITIVE_BLEND);
        let dimming = match mode {
            CompositeMode::Additive => None,
            CompositeMode::Attenuate => Some(build(
                "atmosphere-dimming-pipeline",
                "fs_transmittance",
                MULTIPLY_BLEND,
            )),
        };

        if let Some(error) = pollster::block_on(scope.pop()) {
            tracing::error!("Atmosphere pipeline rejected: {error}");
            return Err(AtmosphereError::PipelineCreation(error.to_string()));
        }

        tracing::info!(
            scatter_points = counts.scatter_points,
            optical_depth_points = counts.optical_depth_points,
            %mode,
            "Created atmosphere pipeline"
        );

        Ok(Self {
            light,
            dimming,
            bind_group_layout,
            counts,
            mode,
        })
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn sample_counts(&self) -> SampleCounts {
        self.counts
    }

    pub fn composite_mode(&self) -> CompositeMode {
        self.mode
    }
}

/// One planet's atmosphere: parameters, uniform buffer, and its binding to
/// the current frame buffers.
pub struct AtmosphereRenderer {
    params: AtmosphereParameters,
    uniform_buffer: wgpu::Buffer,
    /// Bind group and the generation of the target it reads from.
    binding: Option<(wgpu::BindGroup, u64)>,
}

impl AtmosphereRenderer {
    pub fn new(device: &wgpu::Device, params: AtmosphereParameters) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atmosphere-uniform"),
            size: std::mem::size_of::<AtmosphereUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            params,
            uniform_buffer,
            binding: None,
        }
    }

    pub fn params(&self) -> &AtmosphereParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut AtmosphereParameters {
        &mut self.params
    }

    /// Point this atmosphere at the depth attachment of `target`.
    pub fn bind(
        &mut self,
        device: &wgpu::Device,
        pipeline: &AtmospherePipeline,
        target: &OffscreenTarget,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atmosphere-bind-group"),
            layout: pipeline.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&target.depth.view),
                },
            ],
        });
        self.binding = Some((bind_group, target.generation()));
    }

    /// Generation of the target the current binding reads from.
    pub fn bound_generation(&self) -> Option<u64> {
        self.binding.as_ref().map(|(_, generation)| *generation)
    }

    /// Whether the current binding reads from the target with `generation`.
    pub fn is_bound_to(&self, generation: u64) -> bool {
        self.bound_generation() == Some(generation)
    }

    /// Check the binding against `current_generation` without recording anything.
    pub fn check_binding(&self, current_generation: u64) -> Result<(), AtmosphereError> {
        match self.bound_generation() {
            None => Err(AtmosphereError::Unbound),
            Some(bound) if bound != current_generation => Err(AtmosphereError::StaleFrameBuffers {
                bound,
                current: current_generation,
            }),
            Some(_) => Ok(()),
        }
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, camera: &Camera) {
        let uniform = self.params.to_uniform(camera);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Record the overlay draw. Refuses to draw against a replaced target.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipeline: &AtmospherePipeline,
        shell_mesh: &MeshBuffer,
        current_generation: u64,
    ) -> Result<(), AtmosphereError> {
        self.check_binding(current_generation)?;
        let Some((bind_group, _)) = &self.binding else {
            return Err(AtmosphereError::Unbound);
        };
        for stage in pipeline.dimming.iter().chain([&pipeline.light]) {
            pass.set_pipeline(stage);
            pass.set_bind_group(0, bind_group, &[]);
            shell_mesh.draw(pass);
        }
        Ok(())
    }
}
