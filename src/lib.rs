//! Procedural planet terrain generator.
//!
//! This crate builds a cube-sphere base mesh, displaces it with layered noise
//! evaluated by a compute device (wgpu or a sequential reference device), and
//! assembles a renderable terrain mesh with shading data and an ocean shell.

pub mod compute;
pub mod geometry;
pub mod noise;
pub mod planet;
pub mod random;
pub mod terrain;

pub use compute::{ComputeBackend, ComputeDevice, ComputeError, ReferenceDevice};
pub use geometry::{CubeFaceId, SphereGeometry, SphereMeshCache};
pub use noise::{RidgeNoiseSettings, SimpleNoiseSettings};
pub use planet::{GeneratedPlanet, GenerationError, PlanetConfig, PlanetGenerator, RenderSink};
pub use random::Prng;
pub use terrain::{HeightRange, IndexFormat, OceanShell, TerrainMesh};
