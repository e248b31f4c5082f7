//! Latitude/longitude unit sphere mesh.
//!
//! Planets and atmosphere shells both draw this mesh, scaled and translated
//! by their own uniforms.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

use crate::buffer::{VertexPositionColor, VertexPositionNormalUv};

/// A unit sphere with equirectangular texture coordinates.
pub struct SphereMesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list, counter-clockwise when seen from outside.
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Build a sphere with `width_segments` slices around Y and
    /// `height_segments` stacks from pole to pole.
    ///
    /// The seam column is duplicated so `u` runs the full 0..=1 range.
    /// Segment counts below 3 and 2 respectively are raised to those minimums.
    pub fn uv_sphere(width_segments: u32, height_segments: u32) -> Self {
        let width = width_segments.max(3);
        let height = height_segments.max(2);
        let columns = width + 1;

        let mut positions = Vec::with_capacity((columns * (height + 1)) as usize);
        let mut uvs = Vec::with_capacity(positions.capacity());

        for iy in 0..=height {
            let v = iy as f32 / height as f32;
            let theta = v * PI;
            for ix in 0..=width {
                let u = ix as f32 / width as f32;
                let phi = u * TAU;
                positions.push(Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                ));
                uvs.push([u, v]);
            }
        }

        let index = |ix: u32, iy: u32| iy * columns + ix;
        let mut indices = Vec::with_capacity((width * (height - 1) * 6) as usize);
        for iy in 0..height {
            for ix in 0..width {
                let a = index(ix + 1, iy);
                let b = index(ix, iy);
                let c = index(ix, iy + 1);
                let d = index(ix + 1, iy + 1);
                // Pole rows collapse to a single triangle per segment.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            positions,
            uvs,
            indices,
        }
    }

    /// Vertices for lit, textured drawing; normals equal positions on a unit sphere.
    pub fn textured_vertices(&self) -> Vec<VertexPositionNormalUv> {
        self.positions
            .iter()
            .zip(&self.uvs)
            .map(|(position, uv)| VertexPositionNormalUv {
                position: position.to_array(),
                normal: position.to_array(),
                uv: *uv,
            })
            .collect()
    }

    /// Flat-colored vertices of this sphere placed at `center` with `radius`.
    pub fn colored_vertices(
        &self,
        center: Vec3,
        radius: f32,
        color: [f32; 4],
    ) -> Vec<VertexPositionColor> {
        self.positions
            .iter()
            .map(|p| VertexPositionColor {
                position: (center + *p * radius).to_array(),
                color,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_on_unit_sphere() {
        let mesh = SphereMesh::uv_sphere(30, 30);
        for pos in &mesh.positions {
            assert!((pos.length() - 1.0).abs() < 1e-5, "length = {}", pos.length());
        }
    }

    #[test]
    fn test_triangle_count() {
        let mesh = SphereMesh::uv_sphere(30, 30);
        assert_eq!(mesh.indices.len() / 3, 2 * 30 * 29);
    }

    #[test]
    fn test_indices_valid() {
        let mesh = SphereMesh::uv_sphere(12, 8);
        let n = mesh.positions.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_uvs_in_range() {
        let mesh = SphereMesh::uv_sphere(16, 16);
        for [u, v] in &mesh.uvs {
            assert!((0.0..=1.0).contains(u));
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn test_triangles_wind_outward() {
        let mesh = SphereMesh::uv_sphere(24, 12);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.positions[tri[i] as usize]);
            let normal = (b - a).cross(c - a);
            if normal.length() < 1e-9 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn test_minimum_segments_enforced() {
        let mesh = SphereMesh::uv_sphere(0, 0);
        assert_eq!(mesh.positions.len(), 4 * 3);
        assert!(!mesh.indices.is_empty());
    }

    #[test]
    fn test_colored_vertices_are_placed() {
        let mesh = SphereMesh::uv_sphere(8, 4);
        let center = Vec3::new(10.0, 0.0, 0.0);
        for v in mesh.colored_vertices(center, 2.0, [1.0; 4]) {
            let offset = Vec3::from_array(v.position) - center;
            assert!((offset.length() - 2.0).abs() < 1e-4);
        }
    }
}
