//! Displaced terrain mesh assembly.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::SphereGeometry;

/// Meshes with fewer vertices than this use 16-bit indices.
pub const U16_VERTEX_LIMIT: usize = 65_535;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("Height buffer holds {actual} values for {expected} vertices")]
    HeightCountMismatch { expected: usize, actual: usize },
    #[error("Shading buffer holds {actual} values for {expected} vertices")]
    ShadingCountMismatch { expected: usize, actual: usize },
    #[error("Triangle index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("Vertex index {index} does not fit a 16-bit index buffer")]
    IndexOverflow { index: u32 },
}

/// Width of the mesh index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// `U16` iff `vertex_count < 65535`.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count < U16_VERTEX_LIMIT {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Converts triangle indices to `format`, failing instead of truncating.
    pub fn from_triangles(triangles: &[u32], format: IndexFormat) -> Result<Self, MeshError> {
        match format {
            IndexFormat::U32 => Ok(IndexBuffer::U32(triangles.to_vec())),
            IndexFormat::U16 => triangles
                .iter()
                .map(|&index| u16::try_from(index).map_err(|_| MeshError::IndexOverflow { index }))
                .collect::<Result<Vec<_>, _>>()
                .map(IndexBuffer::U16),
        }
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            IndexBuffer::U16(_) => IndexFormat::U16,
            IndexBuffer::U32(_) => IndexFormat::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices widened to `u32`.
    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            IndexBuffer::U16(v) => v.iter().map(|&i| u32::from(i)).collect(),
            IndexBuffer::U32(v) => v.clone(),
        }
    }
}

/// Smallest and largest height multiplier of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightRange {
    pub min: f32,
    pub max: f32,
}

impl HeightRange {
    /// Scans `heights`; `None` when empty.
    pub fn from_heights(heights: &[f32]) -> Option<Self> {
        let (&first, rest) = heights.split_first()?;
        Some(rest.iter().fold(Self { min: first, max: first }, |r, &h| Self {
            min: r.min.min(h),
            max: r.max.max(h),
        }))
    }

    /// Linear interpolation from `min` (t = 0) to `max` (t = 1).
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }
}

/// Final renderable terrain: displaced positions plus per-vertex attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainMesh {
    pub positions: Vec<Vec3>,
    pub indices: IndexBuffer,
    pub normals: Vec<Vec3>,
    /// Crude `(-n.z, 0, n.x, 1)` tangents; not normalized.
    pub tangents: Vec<Vec4>,
    /// Per-vertex shading noise `(large, small, detail, 0)`; zeros until merged.
    pub shading: Vec<Vec4>,
}

impl TerrainMesh {
    /// Displaces `geometry` radially by `heights` and derives the vertex attributes.
    ///
    /// Returns the mesh together with the height range seen while displacing.
    pub fn assemble(geometry: &SphereGeometry, heights: &[f32]) -> Result<(Self, HeightRange), MeshError> {
        let vertex_count = geometry.vertices.len();
        if heights.len() != vertex_count {
            return Err(MeshError::HeightCountMismatch {
                expected: vertex_count,
                actual: heights.len(),
            });
        }
        if let Some(&index) = geometry.triangles.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange { index, vertex_count });
        }

        let mut range = HeightRange {
            min: f32::MAX,
            max: f32::MIN,
        };
        let positions: Vec<Vec3> = geometry
            .vertices
            .iter()
            .zip(heights)
            .map(|(&v, &h)| {
                range.min = range.min.min(h);
                range.max = range.max.max(h);
                v * h
            })
            .collect();
        if vertex_count == 0 {
            range = HeightRange { min: 0.0, max: 0.0 };
        }

        let indices = IndexBuffer::from_triangles(&geometry.triangles, IndexFormat::for_vertex_count(vertex_count))?;
        let normals = vertex_normals(&positions, &geometry.triangles);
        let tangents = normals.iter().map(|&n| crude_tangent(n)).collect();

        let mesh = Self {
            positions,
            indices,
            normals,
            tangents,
            shading: vec![Vec4::ZERO; vertex_count],
        };
        Ok((mesh, range))
    }

    /// Replaces the shading channel.
    pub fn set_shading_data(&mut self, shading: Vec<Vec4>) -> Result<(), MeshError> {
        if shading.len() != self.positions.len() {
            return Err(MeshError::ShadingCountMismatch {
                expected: self.positions.len(),
                actual: shading.len(),
            });
        }
        self.shading = shading;
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn index_format(&self) -> IndexFormat {
        self.indices.format()
    }

    pub fn indices_u32(&self) -> Vec<u32> {
        self.indices.to_u32()
    }
}

/// Area-weighted vertex normals; falls back to the radial direction where the sum vanishes.
fn vertex_normals(positions: &[Vec3], triangles: &[u32]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        // Unnormalized cross product: magnitude is twice the triangle area.
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        sums[a] += n;
        sums[b] += n;
        sums[c] += n;
    }
    sums.iter()
        .zip(positions)
        .map(|(sum, p)| sum.try_normalize().unwrap_or_else(|| p.normalize_or_zero()))
        .collect()
}

fn crude_tangent(n: Vec3) -> Vec4 {
    if n.x.abs() <= f32::EPSILON && n.z.abs() <= f32::EPSILON {
        return Vec4::new(1.0, 0.0, 0.0, 1.0);
    }
    Vec4::new(-n.z, 0.0, n.x, 1.0)
}
