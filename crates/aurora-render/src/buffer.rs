//! Vertex formats and indexed mesh buffers.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Vertex and index buffers for one indexed mesh.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    vertex_count: u32,
}

impl MeshBuffer {
    /// Upload vertices and 32-bit indices. The vertex buffer stays writable
    /// so geometry can be moved with [`MeshBuffer::write_vertices`].
    pub fn upload<V: Pod>(
        device: &wgpu::Device,
        label: &str,
        vertices: &[V],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            vertex_count: vertices.len() as u32,
        }
    }

    /// Overwrite the vertex data in place. Returns `false` (and writes nothing)
    /// when the vertex count differs from the uploaded mesh.
    pub fn write_vertices<V: Pod>(&self, queue: &wgpu::Queue, vertices: &[V]) -> bool {
        if vertices.len() as u32 != self.vertex_count {
            log::warn!(
                "Ignoring vertex write of {} vertices into a mesh of {}",
                vertices.len(),
                self.vertex_count
            );
            return false;
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        true
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Bind both buffers and draw every index once.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Position + RGBA color, used by debug geometry and markers.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPositionColor {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl VertexPositionColor {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Position + normal + texture coordinate, used by sphere meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPositionNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexPositionNormalUv {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

static_assertions::assert_eq_size!(VertexPositionColor, [u8; 28]);
static_assertions::assert_eq_size!(VertexPositionNormalUv, [u8; 32]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::request_headless_device_blocking;

    #[test]
    fn test_position_color_layout() {
        let layout = VertexPositionColor::layout();
        assert_eq!(layout.array_stride, 28);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn test_position_normal_uv_layout() {
        let layout = VertexPositionNormalUv::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 24);
        assert_eq!(layout.attributes[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn test_upload_records_counts() {
        let Ok((device, _queue)) = request_headless_device_blocking() else {
            return;
        };
        let vertices = [VertexPositionColor {
            position: [0.0; 3],
            color: [1.0; 4],
        }; 3];
        let mesh = MeshBuffer::upload(&device, "triangle", &vertices, &[0, 1, 2]);
        assert_eq!(mesh.index_count, 3);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_write_vertices_rejects_count_mismatch() {
        let Ok((device, queue)) = request_headless_device_blocking() else {
            return;
        };
        let vertex = VertexPositionColor {
            position: [0.0; 3],
            color: [1.0; 4],
        };
        let mesh = MeshBuffer::upload(&device, "line", &[vertex; 2], &[0, 1]);
        assert!(!mesh.write_vertices(&queue, &[vertex; 3]));
        assert!(mesh.write_vertices(&queue, &[vertex; 2]));
    }
}
