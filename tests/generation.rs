//! End-to-end generation tests on the reference device.

use std::sync::Arc;

use planetgen::compute::{ComputeDevice, ComputeError, ReferenceBuffer, ReferenceDevice};
use planetgen::planet::{ConfigError, GenerationError, PlanetConfig, PlanetGenerator};
use planetgen::terrain::{HeightFieldEvaluator, IndexFormat, TerrainMesh, OCEAN_SHELL_MARGIN};
use planetgen::{SphereGeometry, SphereMeshCache};

fn config(seed: u64, resolution: u32) -> PlanetConfig {
    PlanetConfig {
        resolution,
        ..PlanetConfig::earth_like(seed)
    }
}

/// Fails every height evaluation after the vertices were uploaded.
struct FailingHeightField;

impl HeightFieldEvaluator<ReferenceDevice> for FailingHeightField {
    fn name(&self) -> &str {
        "failing"
    }

    fn calculate_heights(
        &self,
        _device: &ReferenceDevice,
        _vertices: &ReferenceBuffer,
        _config: &PlanetConfig,
    ) -> Result<Vec<f32>, ComputeError> {
        Err(ComputeError::Dispatch {
            kernel: "height_map",
            reason: "device lost".to_string(),
        })
    }
}

#[test]
fn test_flat_planet_end_to_end() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    let flat = PlanetConfig {
        resolution: 4,
        ..PlanetConfig::flat(42)
    };
    let planet = generator.generate(&flat).unwrap();

    assert_eq!(planet.mesh.vertex_count(), 96);
    assert_eq!(planet.mesh.triangle_count(), 108);
    assert_eq!(planet.mesh.index_format(), IndexFormat::U16);
    assert_eq!(planet.height_range.min, 1.0);
    assert_eq!(planet.height_range.max, 1.0);
    for p in &planet.mesh.positions {
        assert!((p.length() - 1.0).abs() < 1e-5);
    }

    let ocean = planet.ocean.expect("ocean enabled by default");
    assert!((ocean.radius - (1.0 + OCEAN_SHELL_MARGIN)).abs() < 1e-6);

    // min == max, so the ocean level has no effect on the shell.
    for level in [0.0, 0.3, 1.0] {
        let mut leveled = flat.clone();
        leveled.ocean.level = level;
        let ocean = generator.generate(&leveled).unwrap().ocean.unwrap();
        assert!((ocean.radius - (1.0 + OCEAN_SHELL_MARGIN)).abs() < 1e-6, "level {level}");
    }
}

#[test]
fn test_earth_like_planet_has_oceans_and_land() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    for seed in [1, 42, 999] {
        let planet = generator.generate(&config(seed, 16)).unwrap();
        let radii: Vec<f32> = planet.mesh.positions.iter().map(|p| p.length()).collect();
        // Mountains only ever raise the surface, so anything below the unit
        // sphere comes from a negative continent value.
        let below = radii.iter().filter(|r| **r < 1.0).count();
        let above = radii.iter().filter(|r| **r > 1.0).count();
        assert!(below > 0, "seed {seed}: no ocean floor");
        assert!(above > 0, "seed {seed}: no land");
        assert!(planet.height_range.min < 1.0 && planet.height_range.max > 1.0);
    }
}

#[test]
fn test_ocean_radius_follows_body_scale() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    let scaled = PlanetConfig {
        resolution: 3,
        body_scale: 2.0,
        ..PlanetConfig::flat(1)
    };
    let ocean = generator.generate(&scaled).unwrap().ocean.unwrap();
    assert!((ocean.radius - (2.0 + OCEAN_SHELL_MARGIN)).abs() < 1e-6);
}

#[test]
fn test_generation_is_deterministic() {
    let mut a = PlanetGenerator::new(ReferenceDevice::new());
    let mut b = PlanetGenerator::new(ReferenceDevice::new());

    let first = a.generate(&config(77, 6)).unwrap().clone();
    let second = b.generate(&config(77, 6)).unwrap().clone();
    assert_eq!(first.mesh, second.mesh);
    assert_eq!(first.height_range, second.height_range);

    let other = b.generate(&config(78, 6)).unwrap();
    assert_ne!(first.mesh.positions, other.mesh.positions);
}

#[test]
fn test_seed_changes_shape_not_topology() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    let first = generator.generate(&config(1, 5)).unwrap().mesh.clone();
    let second = generator.generate(&config(2, 5)).unwrap().mesh.clone();
    assert_eq!(first.indices, second.indices);
    assert_ne!(first.positions, second.positions);
}

#[test]
fn test_cache_builds_each_resolution_once() {
    let cache = Arc::new(SphereMeshCache::new());
    let mut a = PlanetGenerator::with_cache(ReferenceDevice::new(), Arc::clone(&cache));
    let mut b = PlanetGenerator::with_cache(ReferenceDevice::new(), Arc::clone(&cache));

    a.generate(&config(1, 4)).unwrap();
    a.generate(&config(2, 4)).unwrap();
    b.generate(&config(3, 4)).unwrap();
    assert_eq!(cache.len(), 1);

    b.generate(&config(3, 5)).unwrap();
    assert_eq!(cache.len(), 2);
    assert!(cache.contains(4) && cache.contains(5));
}

#[test]
fn test_cached_geometry_is_not_shared_mutably() {
    let cache = SphereMeshCache::new();
    let mut copy = cache.get(4).unwrap();
    copy.vertices.iter_mut().for_each(|v| *v *= 3.0);

    let fresh = cache.get(4).unwrap();
    assert!(fresh.vertices.iter().all(|v| (v.length() - 1.0).abs() < 1e-5));
}

#[test]
fn test_index_format_boundary() {
    // 6 * 104^2 = 64896 vertices, 6 * 105^2 = 66150.
    for (resolution, expected) in [(104, IndexFormat::U16), (105, IndexFormat::U32)] {
        let geometry = SphereGeometry::new(resolution).unwrap();
        let heights = vec![1.0; geometry.vertex_count()];
        let (mesh, _) = TerrainMesh::assemble(&geometry, &heights).unwrap();
        assert_eq!(mesh.index_format(), expected);
        let max = mesh.indices_u32().into_iter().max().unwrap() as usize;
        assert_eq!(max, mesh.vertex_count() - 1);
    }
}

#[test]
fn test_allocation_failure_keeps_previous_planet() {
    // 96 vertices * 16 bytes fit, 216 * 16 do not.
    let mut generator = PlanetGenerator::new(ReferenceDevice::with_max_buffer_size(2048));
    let previous = generator.generate(&config(5, 4)).unwrap().clone();

    let err = generator.generate(&config(6, 6)).unwrap_err();
    assert!(matches!(err, GenerationError::Compute(ComputeError::Allocation { .. })));

    let current = generator.current().unwrap();
    assert_eq!(current.seed, previous.seed);
    assert_eq!(current.mesh, previous.mesh);
    assert_eq!(current.ocean, previous.ocean);
    assert_eq!(generator.device().live_buffers(), 0);
}

#[test]
fn test_height_failure_releases_buffers() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new()).with_height_field(Box::new(FailingHeightField));
    let err = generator.generate(&config(1, 4)).unwrap_err();
    assert!(matches!(err, GenerationError::Compute(ComputeError::Dispatch { .. })));
    assert!(generator.current().is_none());
    assert!(generator.height_range().is_none());
    assert_eq!(generator.device().live_buffers(), 0);
}

#[test]
fn test_ocean_disabled_removes_shell() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    assert!(generator.generate(&config(1, 4)).unwrap().ocean.is_some());

    let mut dry = config(1, 4);
    dry.ocean.enabled = false;
    assert!(generator.generate(&dry).unwrap().ocean.is_none());

    // Re-enabling creates a fresh shell.
    let shell = generator.generate(&config(1, 4)).unwrap().ocean.unwrap();
    assert_eq!(shell.revision, 0);
}

#[test]
fn test_shading_data_is_merged() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    let planet = generator.generate(&config(9, 4)).unwrap();
    assert_eq!(planet.mesh.shading.len(), planet.mesh.vertex_count());
    assert!(planet.mesh.shading.iter().all(|s| s.w == 0.0 && s.is_finite()));
    assert!(planet.mesh.shading.iter().any(|s| s.x != 0.0 || s.y != 0.0 || s.z != 0.0));
}

#[test]
fn test_invalid_resolution_is_rejected() {
    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    for resolution in [0, 1] {
        let err = generator.generate(&config(1, resolution)).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Config(ConfigError::InvalidResolution(r)) if r == resolution
        ));
    }
    assert!(generator.current().is_none());
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planet.json");
    std::fs::write(&path, r#"{"seed": 11, "resolution": 3, "ocean": {"level": 0.25}}"#).unwrap();

    let loaded = PlanetConfig::load(&path).unwrap();
    assert_eq!(loaded.seed, 11);
    assert_eq!(loaded.resolution, 3);
    assert_eq!(loaded.ocean.level, 0.25);

    let mut generator = PlanetGenerator::new(ReferenceDevice::new());
    assert_eq!(generator.generate(&loaded).unwrap().mesh.vertex_count(), 54);
}

#[test]
fn test_load_missing_or_malformed_config() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PlanetConfig::load(dir.path().join("missing.json")),
        Err(ConfigError::Io(_))
    ));

    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ seed: ").unwrap();
    assert!(matches!(PlanetConfig::load(&path), Err(ConfigError::Parse(_))));
}
