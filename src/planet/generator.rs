//! Planet generation orchestration.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use super::{ConfigError, PlanetConfig, TerrainMaterial};
use crate::compute::{ComputeDevice, ComputeError};
use crate::geometry::{GeometryError, SphereMeshCache};
use crate::terrain::{
    update_ocean_shell, HeightFieldEvaluator, HeightRange, LerpOceanShell, MeshError, NoiseHeightField, OceanShell,
    OceanShellStrategy, TerrainMesh,
};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Geometry failed: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Compute failed: {0}")]
    Compute(#[from] ComputeError),
    #[error("Mesh assembly failed: {0}")]
    Mesh(#[from] MeshError),
}

/// Receives a generated planet for display.
pub trait RenderSink {
    fn set_terrain_mesh(&mut self, mesh: &TerrainMesh);
    fn set_terrain_material(&mut self, material: &TerrainMaterial);
    /// `None` when the ocean is disabled.
    fn set_ocean_shell(&mut self, shell: Option<&OceanShell>);
}

/// The result of one successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedPlanet {
    pub seed: u64,
    pub resolution: u32,
    pub mesh: TerrainMesh,
    pub height_range: HeightRange,
    pub material: TerrainMaterial,
    pub ocean: Option<OceanShell>,
}

/// Drives geometry, compute and mesh assembly, and keeps the last good planet.
pub struct PlanetGenerator<D: ComputeDevice> {
    device: D,
    cache: Arc<SphereMeshCache>,
    height_field: Box<dyn HeightFieldEvaluator<D>>,
    ocean_strategy: Box<dyn OceanShellStrategy>,
    current: Option<GeneratedPlanet>,
}

impl<D: ComputeDevice> PlanetGenerator<D> {
    pub fn new(device: D) -> Self {
        Self::with_cache(device, Arc::new(SphereMeshCache::new()))
    }

    /// Shares `cache` with other generators.
    pub fn with_cache(device: D, cache: Arc<SphereMeshCache>) -> Self {
        Self {
            device,
            cache,
            height_field: Box::new(NoiseHeightField),
            ocean_strategy: Box::new(LerpOceanShell::default()),
            current: None,
        }
    }

    pub fn with_height_field(mut self, height_field: Box<dyn HeightFieldEvaluator<D>>) -> Self {
        self.height_field = height_field;
        self
    }

    pub fn with_ocean_strategy(mut self, strategy: Box<dyn OceanShellStrategy>) -> Self {
        self.ocean_strategy = strategy;
        self
    }

    /// Generates a planet from `config` and makes it current.
    ///
    /// Nothing is committed unless every step succeeds: on error the
    /// previously generated planet (if any) stays current. Device buffers
    /// are released on every path.
    pub fn generate(&mut self, config: &PlanetConfig) -> Result<&GeneratedPlanet, GenerationError> {
        let started = Instant::now();
        config.validate()?;

        let step = Instant::now();
        let geometry = self.cache.get(config.resolution)?;
        debug!(
            resolution = config.resolution,
            vertices = geometry.vertex_count(),
            triangles = geometry.triangle_count(),
            elapsed_ms = step.elapsed().as_secs_f64() * 1000.0,
            "base sphere ready"
        );

        let vertices = self.device.upload_vertices("vertices", &geometry.vertices)?;

        let step = Instant::now();
        let heights = self.height_field.calculate_heights(&self.device, &vertices, config)?;
        debug!(
            evaluator = self.height_field.name(),
            device = self.device.name(),
            elapsed_ms = step.elapsed().as_secs_f64() * 1000.0,
            "heights computed"
        );

        let step = Instant::now();
        let (mut mesh, height_range) = TerrainMesh::assemble(&geometry, &heights)?;
        debug!(
            min = height_range.min,
            max = height_range.max,
            index_format = ?mesh.index_format(),
            elapsed_ms = step.elapsed().as_secs_f64() * 1000.0,
            "mesh assembled"
        );

        if let Some(shading) = &config.shading {
            let step = Instant::now();
            let data = shading.generate_shading_data(&self.device, &vertices)?;
            mesh.set_shading_data(data)?;
            debug!(elapsed_ms = step.elapsed().as_secs_f64() * 1000.0, "shading data merged");
        }
        drop(vertices);

        let material = TerrainMaterial::new(&config.material, height_range, config.ocean.level, config.body_scale);
        let mut ocean = self.current.as_ref().and_then(|planet| planet.ocean);
        update_ocean_shell(
            &mut ocean,
            self.ocean_strategy.as_ref(),
            config.ocean.enabled,
            height_range,
            config.ocean.level,
            config.body_scale,
        );

        info!(
            seed = config.seed,
            resolution = config.resolution,
            vertices = mesh.vertex_count(),
            ocean_radius = ocean.map(|shell| shell.radius),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "planet generated"
        );

        let planet = self.current.insert(GeneratedPlanet {
            seed: config.seed,
            resolution: config.resolution,
            mesh,
            height_range,
            material,
            ocean,
        });
        Ok(planet)
    }

    /// Hands the current planet to `sink`. Returns `false` if nothing has been generated.
    pub fn present(&self, sink: &mut dyn RenderSink) -> bool {
        let Some(planet) = &self.current else {
            return false;
        };
        sink.set_terrain_mesh(&planet.mesh);
        sink.set_terrain_material(&planet.material);
        sink.set_ocean_shell(planet.ocean.as_ref());
        true
    }

    pub fn current(&self) -> Option<&GeneratedPlanet> {
        self.current.as_ref()
    }

    pub fn height_range(&self) -> Option<HeightRange> {
        self.current.as_ref().map(|planet| planet.height_range)
    }

    pub fn cache(&self) -> &Arc<SphereMeshCache> {
        &self.cache
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}
