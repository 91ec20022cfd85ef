//! Terrain module.
//!
//! Height evaluation, shading data, mesh assembly and the ocean shell that
//! together turn a base sphere into a renderable planet surface.

mod heights;
mod mesh;
mod ocean;
mod shading;

pub use heights::{HeightFieldEvaluator, NoiseHeightField, ShapeSettings};
pub use mesh::{HeightRange, IndexBuffer, IndexFormat, MeshError, TerrainMesh, U16_VERTEX_LIMIT};
pub use ocean::{update_ocean_shell, LerpOceanShell, OceanShell, OceanShellStrategy, OCEAN_SHELL_MARGIN};
pub use shading::ShadingSettings;
