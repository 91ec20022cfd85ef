//! Planet configuration and the generator that ties the pipeline together.

mod config;
mod generator;
mod material;

pub use config::{ConfigError, OceanSettings, PlanetConfig};
pub use generator::{GeneratedPlanet, GenerationError, PlanetGenerator, RenderSink};
pub use material::{FresnelSettings, MaterialSettings, TerrainColours, TerrainMaterial};
