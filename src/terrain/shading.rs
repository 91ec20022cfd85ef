//! Per-vertex shading noise consumed by the terrain material.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::compute::{self, run_vertex_kernel, ComputeDevice, ComputeError, Kernel, KernelParams};
use crate::noise::{NoiseLayer, SimpleNoiseSettings};
use crate::random::Prng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingSettings {
    /// Seeds the shading layer offsets independently of the shape seed.
    pub seed: u64,
    pub detail_warp: SimpleNoiseSettings,
    pub detail: SimpleNoiseSettings,
    pub large: SimpleNoiseSettings,
    pub small: SimpleNoiseSettings,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        let layer = |num_layers, scale| SimpleNoiseSettings {
            num_layers,
            scale,
            offset: Vec3::ZERO,
            ..Default::default()
        };
        Self {
            seed: 0,
            detail_warp: layer(3, 4.0),
            detail: layer(5, 8.0),
            large: layer(4, 1.2),
            small: layer(4, 12.0),
        }
    }
}

impl ShadingSettings {
    /// Binds the shading kernel's parameters, drawing offsets in the order
    /// detail, detail warp, large, small.
    pub fn kernel_params(&self) -> KernelParams {
        let mut prng = Prng::new(self.seed);
        let mut params = KernelParams::new();
        self.detail
            .set_compute_values(&mut params, &mut prng, compute::DETAIL_PARAMS);
        self.detail_warp
            .set_compute_values(&mut params, &mut prng, compute::DETAIL_WARP_PARAMS);
        self.large.set_compute_values(&mut params, &mut prng, compute::LARGE_PARAMS);
        self.small.set_compute_values(&mut params, &mut prng, compute::SMALL_PARAMS);
        params
    }

    /// Runs the shading kernel over `vertices`.
    pub fn generate_shading_data<D: ComputeDevice>(
        &self,
        device: &D,
        vertices: &D::Buffer,
    ) -> Result<Vec<Vec4>, ComputeError> {
        let floats = run_vertex_kernel(device, Kernel::ShadingData, &self.kernel_params(), vertices)?;
        Ok(floats.chunks_exact(4).map(Vec4::from_slice).collect())
    }

    pub(crate) fn layers_valid(&self) -> bool {
        [&self.detail_warp, &self.detail, &self.large, &self.small]
            .iter()
            .all(|l| l.is_finite())
    }

    pub(crate) fn max_layers(&self) -> u32 {
        [&self.detail_warp, &self.detail, &self.large, &self.small]
            .iter()
            .map(|l| l.num_layers)
            .max()
            .unwrap_or(0)
    }
}
