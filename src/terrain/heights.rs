//! Height-field evaluation: shape settings and the strategy that turns them into heights.

use serde::{Deserialize, Serialize};

use crate::compute::{self, run_vertex_kernel, ComputeDevice, ComputeError, Kernel, KernelParams};
use crate::noise::{NoiseLayer, RidgeNoiseSettings, SimpleNoiseSettings};
use crate::planet::{OceanSettings, PlanetConfig};
use crate::random::Prng;

/// Noise layers that define the planet's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeSettings {
    pub continents: SimpleNoiseSettings,
    pub mountains: RidgeNoiseSettings,
    pub mask: SimpleNoiseSettings,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self {
            continents: SimpleNoiseSettings::continents(),
            mountains: RidgeNoiseSettings::mountains(),
            mask: SimpleNoiseSettings::mountain_mask(),
        }
    }
}

impl ShapeSettings {
    /// Every layer at zero strength and shift: a perfectly round planet.
    pub fn flat() -> Self {
        let base = Self::default();
        Self {
            continents: SimpleNoiseSettings {
                vertical_shift: 0.0,
                ..base.continents.with_strength(0.0)
            },
            mountains: RidgeNoiseSettings {
                vertical_shift: 0.0,
                ..base.mountains.with_strength(0.0)
            },
            mask: SimpleNoiseSettings {
                vertical_shift: 0.0,
                ..base.mask.with_strength(0.0)
            },
        }
    }

    /// Binds the height kernel's parameters.
    ///
    /// Layer offsets are drawn from one stream seeded with `seed`, in the order
    /// continents, mountains, mask.
    pub fn kernel_params(&self, seed: u64, ocean: &OceanSettings) -> KernelParams {
        let mut prng = Prng::new(seed);
        let mut params = KernelParams::new();
        self.continents
            .set_compute_values(&mut params, &mut prng, compute::CONTINENT_PARAMS);
        self.mountains
            .set_compute_values(&mut params, &mut prng, compute::MOUNTAIN_PARAMS);
        self.mask.set_compute_values(&mut params, &mut prng, compute::MASK_PARAMS);
        params
            .set_float(compute::OCEAN_DEPTH_MULTIPLIER, ocean.depth_multiplier)
            .set_float(compute::OCEAN_FLOOR_DEPTH, ocean.floor_depth)
            .set_float(compute::OCEAN_FLOOR_SMOOTHING, ocean.floor_smoothing)
            .set_float(compute::MOUNTAIN_BLEND, ocean.mountain_blend);
        params
    }

    pub(crate) fn layers_valid(&self) -> bool {
        self.continents.is_finite() && self.mountains.is_finite() && self.mask.is_finite()
    }

    pub(crate) fn max_layers(&self) -> u32 {
        self.continents
            .num_layers
            .max(self.mountains.num_layers)
            .max(self.mask.num_layers)
    }
}

/// Produces one height multiplier per uploaded vertex.
pub trait HeightFieldEvaluator<D: ComputeDevice> {
    fn name(&self) -> &str;

    fn calculate_heights(
        &self,
        device: &D,
        vertices: &D::Buffer,
        config: &PlanetConfig,
    ) -> Result<Vec<f32>, ComputeError>;
}

/// Continents, ridged mountains and ocean floor shaping on the height kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseHeightField;

impl<D: ComputeDevice> HeightFieldEvaluator<D> for NoiseHeightField {
    fn name(&self) -> &str {
        "noise"
    }

    fn calculate_heights(
        &self,
        device: &D,
        vertices: &D::Buffer,
        config: &PlanetConfig,
    ) -> Result<Vec<f32>, ComputeError> {
        let params = config.shape.kernel_params(config.seed, &config.ocean);
        run_vertex_kernel(device, Kernel::HeightMap, &params, vertices)
    }
}
