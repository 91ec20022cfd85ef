//! Unit cube-sphere mesh construction.

use glam::Vec3;

use super::face::CubeFaceId;
use super::spherify::project_to_sphere;
use super::{check_resolution, GeometryError};

/// Base unit-sphere geometry for one resolution.
///
/// Each of the six cube faces contributes an `resolution × resolution` vertex grid.
/// Vertices along face seams are duplicated rather than shared, so downstream
/// normal reconstruction treats each face independently.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereGeometry {
    resolution: u32,
    /// Unit-length vertex positions, face by face in [`CubeFaceId::all`] order.
    pub vertices: Vec<Vec3>,
    /// Triangle list; `(b - a) × (c - a)` of every triple points away from the origin.
    pub triangles: Vec<u32>,
}

impl SphereGeometry {
    /// Builds the unit cube-sphere for `resolution` vertices per face edge.
    ///
    /// # Errors
    /// Returns [`GeometryError::InvalidResolution`] when `resolution` is outside
    /// `[MIN_RESOLUTION, MAX_RESOLUTION]`.
    pub fn new(resolution: u32) -> Result<Self, GeometryError> {
        check_resolution(resolution)?;

        let n = resolution as usize;
        let cells = n - 1;
        let mut vertices = Vec::with_capacity(6 * n * n);
        let mut triangles = Vec::with_capacity(6 * cells * cells * 6);
        let step = 1.0 / cells as f32;

        for face in CubeFaceId::all() {
            let base = (face.index() * n * n) as u32;

            for y in 0..n {
                for x in 0..n {
                    let cube = face.uv_to_cube(x as f32 * step, y as f32 * step);
                    vertices.push(project_to_sphere(cube));
                }
            }

            for y in 0..cells {
                for x in 0..cells {
                    let i = base + (y * n + x) as u32;
                    let right = i + 1;
                    let up = i + n as u32;
                    let diag = up + 1;
                    triangles.extend_from_slice(&[i, right, up]);
                    triangles.extend_from_slice(&[right, diag, up]);
                }
            }
        }

        Ok(Self {
            resolution,
            vertices,
            triangles,
        })
    }

    /// Vertices per face edge.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Total vertex count (`6 · resolution²`).
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Total triangle count (`12 · (resolution - 1)²`).
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Vertex count produced by `resolution` without building the mesh: `6·N²`.
    /// Saturates at `usize::MAX`.
    pub fn vertex_count_for(resolution: u32) -> usize {
        let n = resolution as usize;
        n.saturating_mul(n).saturating_mul(6)
    }

    /// Triangle count produced by `resolution` without building the mesh.
    ///
    /// Each face is an `N × N` vertex grid with `(N − 1)²` cells split in two,
    /// so the sphere has `12·(N − 1)²` triangles, not `12·N²`. Saturates at
    /// `usize::MAX`.
    pub fn triangle_count_for(resolution: u32) -> usize {
        let cells = (resolution as usize).saturating_sub(1);
        cells.saturating_mul(cells).saturating_mul(12)
    }

    /// Returns a copy scaled uniformly by `radius`.
    pub fn scaled(&self, radius: f32) -> SphereGeometry {
        SphereGeometry {
            resolution: self.resolution,
            vertices: self.vertices.iter().map(|&v| v * radius).collect(),
            triangles: self.triangles.clone(),
        }
    }
}
