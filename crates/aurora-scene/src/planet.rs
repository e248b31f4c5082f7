//! Planet entity: placement, surface texture, and optional atmosphere.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use aurora_atmosphere::{AtmosphereRenderer, PlanetInfo};
use aurora_render::{ManagedTexture, MeshBuffer};
use glam::Vec3;

use crate::planet_pipeline::{PlanetPipeline, PlanetUniform};

/// Stable handle of a planet inside one compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanetId(pub u64);

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "planet#{}", self.0)
    }
}

/// A textured sphere and, optionally, the atmosphere wrapped around it.
///
/// The placement lives in a shared [`PlanetInfo`] that the atmosphere reads
/// but never owns, so both are dropped together with the planet.
pub struct Planet {
    id: PlanetId,
    info: Arc<PlanetInfo>,
    texture: Arc<ManagedTexture>,
    texture_path: Option<PathBuf>,
    texture_ready: bool,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    atmosphere: Option<AtmosphereRenderer>,
}

impl Planet {
    /// Create the planet with a placeholder texture; the real one may arrive later.
    pub fn new(
        device: &wgpu::Device,
        pipeline: &PlanetPipeline,
        id: PlanetId,
        info: Arc<PlanetInfo>,
        placeholder: Arc<ManagedTexture>,
        texture_path: Option<PathBuf>,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("planet-uniform"),
            size: std::mem::size_of::<PlanetUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("planet-bind-group"),
            layout: pipeline.planet_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            id,
            info,
            texture: placeholder,
            texture_path,
            texture_ready: false,
            uniform_buffer,
            bind_group,
            atmosphere: None,
        }
    }

    pub fn id(&self) -> PlanetId {
        self.id
    }

    pub fn info(&self) -> &Arc<PlanetInfo> {
        &self.info
    }

    pub fn center(&self) -> Vec3 {
        self.info.center()
    }

    pub fn radius(&self) -> f32 {
        self.info.radius()
    }

    pub fn texture_path(&self) -> Option<&PathBuf> {
        self.texture_path.as_ref()
    }

    /// Whether the surface texture has replaced the placeholder.
    pub fn has_texture(&self) -> bool {
        self.texture_ready
    }

    pub fn set_texture(&mut self, texture: Arc<ManagedTexture>) {
        self.texture = texture;
        self.texture_ready = true;
    }

    pub fn atmosphere(&self) -> Option<&AtmosphereRenderer> {
        self.atmosphere.as_ref()
    }

    pub fn atmosphere_mut(&mut self) -> Option<&mut AtmosphereRenderer> {
        self.atmosphere.as_mut()
    }

    pub(crate) fn attach_atmosphere(&mut self, atmosphere: AtmosphereRenderer) {
        self.atmosphere = Some(atmosphere);
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, sun_direction: Vec3) {
        let uniform = PlanetUniform::new(self.center(), self.radius(), sun_direction);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipeline: &PlanetPipeline,
        camera_bind_group: &wgpu::BindGroup,
        mesh: &MeshBuffer,
    ) {
        pipeline.draw(
            pass,
            camera_bind_group,
            &self.texture.bind_group,
            &self.bind_group,
            mesh,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planet_id_display() {
        assert_eq!(PlanetId(3).to_string(), "planet#3");
        assert!(PlanetId(1) < PlanetId(2));
    }
}
