//! Opaque helper geometry: the sun marker sphere and the debug orbit circle.

use std::f32::consts::TAU;

use aurora_render::{MeshBuffer, SphereMesh, VertexPositionColor};
use glam::Vec3;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// White sphere drawn at the sun position.
pub struct SunMarker {
    sphere: SphereMesh,
    radius: f32,
    mesh: MeshBuffer,
}

impl SunMarker {
    pub fn new(device: &wgpu::Device, sphere: SphereMesh, position: Vec3, radius: f32) -> Self {
        let vertices = sphere.colored_vertices(position, radius, WHITE);
        let mesh = MeshBuffer::upload(device, "sun-marker", &vertices, &sphere.indices);
        Self {
            sphere,
            radius,
            mesh,
        }
    }

    /// Rewrite the vertices around a new position.
    pub fn move_to(&self, queue: &wgpu::Queue, position: Vec3) {
        let vertices = self.sphere.colored_vertices(position, self.radius, WHITE);
        self.mesh.write_vertices(queue, &vertices);
    }

    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }
}

/// Closed circle in the XZ plane around the origin, drawn as a line list.
pub struct OrbitLine {
    mesh: MeshBuffer,
}

impl OrbitLine {
    pub fn new(device: &wgpu::Device, radius: f32, segments: u32) -> Self {
        let (vertices, indices) = orbit_circle(radius, segments);
        Self {
            mesh: MeshBuffer::upload(device, "orbit-line", &vertices, &indices),
        }
    }

    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }
}

/// Circle vertices and line-list indices; fewer than 3 segments are raised to 3.
pub fn orbit_circle(radius: f32, segments: u32) -> (Vec<VertexPositionColor>, Vec<u32>) {
    let segments = segments.max(3);
    let vertices = (0..segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * TAU;
            VertexPositionColor {
                position: [angle.cos() * radius, 0.0, angle.sin() * radius],
                color: WHITE,
            }
        })
        .collect();
    let indices = (0..segments)
        .flat_map(|i| [i, (i + 1) % segments])
        .collect();
    (vertices, indices)
}
