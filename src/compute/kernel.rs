//! Kernel descriptions and named parameter bindings.
//!
//! A [`Kernel`] names its parameter slots, its output buffer and the number of
//! floats it writes per vertex. [`KernelParams`] collects named values on the
//! host and packs them into the fixed uniform block every device consumes.

use std::collections::BTreeMap;

use glam::Vec3;

use super::ComputeError;
use crate::noise::{blend, simple_noise, smooth_max, smoothed_ridged_noise, NOISE_PARAM_FLOATS};

/// vec4 slots in a packed parameter block.
pub const PARAM_VEC4S: usize = 16;

/// Floats in a packed parameter block.
pub const PARAM_FLOATS: usize = PARAM_VEC4S * 4;

/// Parameter block in the layout the kernels read.
pub type PackedParams = [f32; PARAM_FLOATS];

/// Name of the input vertex buffer binding shared by every kernel.
pub const VERTEX_BUFFER: &str = "vertices";

pub const CONTINENT_PARAMS: &str = "noise_params_continents";
pub const MOUNTAIN_PARAMS: &str = "noise_params_mountains";
pub const MASK_PARAMS: &str = "noise_params_mask";
pub const OCEAN_DEPTH_MULTIPLIER: &str = "ocean_depth_multiplier";
pub const OCEAN_FLOOR_DEPTH: &str = "ocean_floor_depth";
pub const OCEAN_FLOOR_SMOOTHING: &str = "ocean_floor_smoothing";
pub const MOUNTAIN_BLEND: &str = "mountain_blend";

pub const DETAIL_PARAMS: &str = "noise_params_detail";
pub const DETAIL_WARP_PARAMS: &str = "noise_params_detail_warp";
pub const LARGE_PARAMS: &str = "noise_params_large";
pub const SMALL_PARAMS: &str = "noise_params_small";

/// Radius of the undisturbed surface.
const HEIGHT_BASELINE: f32 = 1.0;
/// Converts combined noise units into a radius fraction.
const ELEVATION_SCALE: f32 = 0.01;
/// How much continent shape leaks into the ocean floor.
const OCEAN_FLOOR_RELIEF: f32 = 0.15;
/// Domain warp applied to the detail layer by the warp layer.
const DETAIL_WARP_STRENGTH: f32 = 0.1;

/// One named parameter inside a packed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    pub name: &'static str,
    /// Offset in floats.
    pub offset: usize,
    /// Length in floats.
    pub len: usize,
}

const fn slot(name: &'static str, offset: usize, len: usize) -> ParamSlot {
    ParamSlot { name, offset, len }
}

const HEIGHT_MAP_SLOTS: &[ParamSlot] = &[
    slot(CONTINENT_PARAMS, 0, NOISE_PARAM_FLOATS),
    slot(MOUNTAIN_PARAMS, 12, NOISE_PARAM_FLOATS),
    slot(MASK_PARAMS, 24, NOISE_PARAM_FLOATS),
    slot(OCEAN_DEPTH_MULTIPLIER, 36, 1),
    slot(OCEAN_FLOOR_DEPTH, 37, 1),
    slot(OCEAN_FLOOR_SMOOTHING, 38, 1),
    slot(MOUNTAIN_BLEND, 39, 1),
];

const SHADING_DATA_SLOTS: &[ParamSlot] = &[
    slot(DETAIL_PARAMS, 0, NOISE_PARAM_FLOATS),
    slot(DETAIL_WARP_PARAMS, 12, NOISE_PARAM_FLOATS),
    slot(LARGE_PARAMS, 24, NOISE_PARAM_FLOATS),
    slot(SMALL_PARAMS, 36, NOISE_PARAM_FLOATS),
];

/// The per-vertex compute programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// One radius multiplier per vertex.
    HeightMap,
    /// One 4-component shading vector per vertex.
    ShadingData,
}

impl Kernel {
    /// Kernel name; doubles as the shader entry point.
    pub const fn label(self) -> &'static str {
        match self {
            Kernel::HeightMap => "height_map",
            Kernel::ShadingData => "shading_data",
        }
    }

    /// Name of the output buffer binding.
    pub const fn output_name(self) -> &'static str {
        match self {
            Kernel::HeightMap => "heights",
            Kernel::ShadingData => "shading_data",
        }
    }

    /// Floats written per vertex.
    pub const fn output_components(self) -> usize {
        match self {
            Kernel::HeightMap => 1,
            Kernel::ShadingData => 4,
        }
    }

    /// Named parameter slots the kernel reads.
    pub const fn params(self) -> &'static [ParamSlot] {
        match self {
            Kernel::HeightMap => HEIGHT_MAP_SLOTS,
            Kernel::ShadingData => SHADING_DATA_SLOTS,
        }
    }

    /// Evaluates one invocation on the host. Only the first
    /// [`output_components`](Self::output_components) values are meaningful.
    pub fn evaluate(self, packed: &PackedParams, pos: Vec3) -> [f32; 4] {
        match self {
            Kernel::HeightMap => [height_at(packed, pos), 0.0, 0.0, 0.0],
            Kernel::ShadingData => shading_at(packed, pos),
        }
    }
}

fn layer(packed: &PackedParams, offset: usize) -> [f32; NOISE_PARAM_FLOATS] {
    let mut out = [0.0; NOISE_PARAM_FLOATS];
    out.copy_from_slice(&packed[offset..offset + NOISE_PARAM_FLOATS]);
    out
}

fn height_at(packed: &PackedParams, pos: Vec3) -> f32 {
    let ocean_depth_multiplier = packed[36];
    let ocean_floor_depth = packed[37];
    let ocean_floor_smoothing = packed[38];
    let mountain_blend = packed[39];

    let mut continent_shape = simple_noise(pos, &layer(packed, 0));
    let ridges = smoothed_ridged_noise(pos, &layer(packed, 12));
    let mask = blend(0.0, mountain_blend, simple_noise(pos, &layer(packed, 24)));

    // Flatten everything below the ocean floor, then deepen the oceans.
    let ocean_floor_shape = -ocean_floor_depth + continent_shape * OCEAN_FLOOR_RELIEF;
    continent_shape = smooth_max(continent_shape, ocean_floor_shape, ocean_floor_smoothing);
    if continent_shape < 0.0 {
        continent_shape *= 1.0 + ocean_depth_multiplier;
    }

    let mountain_shape = ridges * mask;
    HEIGHT_BASELINE + (continent_shape + mountain_shape) * ELEVATION_SCALE
}

fn shading_at(packed: &PackedParams, pos: Vec3) -> [f32; 4] {
    let large = simple_noise(pos, &layer(packed, 24));
    let small = simple_noise(pos, &layer(packed, 36));
    let warp = simple_noise(pos, &layer(packed, 12));
    let detail = simple_noise(pos + Vec3::splat(warp * DETAIL_WARP_STRENGTH), &layer(packed, 0));
    [large, small, detail, 0.0]
}

/// Named scalar/vector parameters bound to a kernel before dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelParams {
    values: BTreeMap<String, Vec<f32>>,
}

impl KernelParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a scalar.
    pub fn set_float(&mut self, name: &str, value: f32) -> &mut Self {
        self.set_floats(name, &[value])
    }

    /// Binds a float array, replacing any previous binding of `name`.
    pub fn set_floats(&mut self, name: &str, values: &[f32]) -> &mut Self {
        self.values.insert(name.to_string(), values.to_vec());
        self
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Packs the bindings into `kernel`'s block layout.
    ///
    /// # Errors
    /// Fails when a slot is unbound or bound with the wrong number of floats.
    /// Bindings the kernel does not read are ignored.
    pub fn pack(&self, kernel: Kernel) -> Result<PackedParams, ComputeError> {
        let mut packed = [0.0; PARAM_FLOATS];
        for slot in kernel.params() {
            let values = self
                .values
                .get(slot.name)
                .ok_or(ComputeError::UnboundParameter {
                    kernel: kernel.label(),
                    name: slot.name,
                })?;
            if values.len() != slot.len {
                return Err(ComputeError::ParameterLength {
                    kernel: kernel.label(),
                    name: slot.name,
                    expected: slot.len,
                    actual: values.len(),
                });
            }
            packed[slot.offset..slot.offset + slot.len].copy_from_slice(values);
        }
        Ok(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{NoiseLayer, RidgeNoiseSettings, SimpleNoiseSettings};
    use crate::random::Prng;

    fn bind_all(kernel: Kernel) -> KernelParams {
        let mut params = KernelParams::new();
        for slot in kernel.params() {
            let values: Vec<f32> = (0..slot.len).map(|i| (slot.offset + i) as f32).collect();
            params.set_floats(slot.name, &values);
        }
        params
    }

    #[test]
    fn test_slots_fit_and_do_not_overlap() {
        for kernel in [Kernel::HeightMap, Kernel::ShadingData] {
            let mut used = [false; PARAM_FLOATS];
            for slot in kernel.params() {
                assert!(slot.offset + slot.len <= PARAM_FLOATS);
                for flag in &mut used[slot.offset..slot.offset + slot.len] {
                    assert!(!*flag, "{} overlaps in {:?}", slot.name, kernel);
                    *flag = true;
                }
            }
        }
    }

    #[test]
    fn test_pack_places_values_at_offsets() {
        let packed = bind_all(Kernel::HeightMap).pack(Kernel::HeightMap).unwrap();
        for i in 0..40 {
            assert_eq!(packed[i], i as f32);
        }
        assert!(packed[40..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pack_rejects_missing_parameter() {
        let mut params = bind_all(Kernel::HeightMap);
        params.values.remove(MOUNTAIN_BLEND);
        match params.pack(Kernel::HeightMap) {
            Err(ComputeError::UnboundParameter { name, .. }) => assert_eq!(name, MOUNTAIN_BLEND),
            other => panic!("expected unbound parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_pack_rejects_wrong_length() {
        let mut params = bind_all(Kernel::ShadingData);
        params.set_floats(SMALL_PARAMS, &[1.0, 2.0]);
        assert!(matches!(
            params.pack(Kernel::ShadingData),
            Err(ComputeError::ParameterLength { expected: 12, actual: 2, .. })
        ));
    }

    #[test]
    fn test_flat_height_is_baseline() {
        // Every layer with zero strength and zero shift.
        let mut packed = [0.0; PARAM_FLOATS];
        packed[3] = 4.0;
        packed[15] = 4.0;
        packed[27] = 4.0;
        packed[37] = 1.5;
        packed[38] = 0.5;
        packed[39] = 1.2;
        for pos in [Vec3::X, Vec3::new(0.3, 0.4, 0.866).normalize(), Vec3::NEG_Z] {
            let [h, ..] = Kernel::HeightMap.evaluate(&packed, pos);
            assert_eq!(h, HEIGHT_BASELINE);
        }
    }

    #[test]
    fn test_deep_floor_is_clamped() {
        // A strongly negative continent is held near the ocean floor before deepening.
        let mut packed = [0.0; PARAM_FLOATS];
        packed[8] = -10.0; // continent vertical shift, zero octaves
        packed[36] = 0.0;
        packed[37] = 2.0;
        packed[38] = 0.0;
        let [h, ..] = Kernel::HeightMap.evaluate(&packed, Vec3::Y);
        let expected = HEIGHT_BASELINE + (-2.0 + -10.0 * OCEAN_FLOOR_RELIEF) * ELEVATION_SCALE;
        assert!((h - expected).abs() < 1e-6, "{} vs {}", h, expected);
    }

    fn sphere_samples(count: usize) -> impl Iterator<Item = Vec3> {
        let golden = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        (0..count).map(move |i| {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f32;
            Vec3::new(theta.cos() * r, y, theta.sin() * r)
        })
    }

    fn height_block(
        continents: &SimpleNoiseSettings,
        mountains: &RidgeNoiseSettings,
        mask: &SimpleNoiseSettings,
        ocean: [f32; 4],
    ) -> PackedParams {
        let mut prng = Prng::new(17);
        let mut params = KernelParams::new();
        continents.set_compute_values(&mut params, &mut prng, CONTINENT_PARAMS);
        mountains.set_compute_values(&mut params, &mut prng, MOUNTAIN_PARAMS);
        mask.set_compute_values(&mut params, &mut prng, MASK_PARAMS);
        params
            .set_float(OCEAN_DEPTH_MULTIPLIER, ocean[0])
            .set_float(OCEAN_FLOOR_DEPTH, ocean[1])
            .set_float(OCEAN_FLOOR_SMOOTHING, ocean[2])
            .set_float(MOUNTAIN_BLEND, ocean[3]);
        params.pack(Kernel::HeightMap).unwrap()
    }

    fn silent_layer() -> SimpleNoiseSettings {
        SimpleNoiseSettings {
            strength: 0.0,
            vertical_shift: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_ocean_floor_is_smoothly_clamped_and_deepened() {
        let (multiplier, floor_depth, smoothing) = (5.0, 1.5, 0.5);
        let continents = SimpleNoiseSettings {
            strength: 4.0,
            vertical_shift: -2.0,
            ..Default::default()
        };
        let mountains = RidgeNoiseSettings {
            strength: 0.0,
            ..Default::default()
        };
        let packed = height_block(
            &continents,
            &mountains,
            &silent_layer(),
            [multiplier, floor_depth, smoothing, 1.2],
        );
        let deepen = |x: f32| if x < 0.0 { x * (1.0 + multiplier) } else { x };

        let (mut clamped, mut open_ocean) = (0, 0);
        for pos in sphere_samples(2048) {
            let continent = simple_noise(pos, &layer(&packed, 0));
            let floor = -floor_depth + continent * OCEAN_FLOOR_RELIEF;
            let [h, ..] = Kernel::HeightMap.evaluate(&packed, pos);
            let elevation = (h - HEIGHT_BASELINE) / ELEVATION_SCALE;

            // smooth_max lies between max(a, b) and max(a, b) + k / 4.
            let lo = continent.max(floor);
            assert!(elevation >= deepen(lo) - 1e-3, "{elevation} below {}", deepen(lo));
            assert!(elevation <= deepen(lo + smoothing / 4.0) + 1e-3);

            if continent < floor - smoothing {
                clamped += 1;
                assert!((elevation - deepen(floor)).abs() < 1e-3);
                assert!(elevation > deepen(continent));
            } else if continent < 0.0 && continent > floor + smoothing {
                open_ocean += 1;
                assert!((elevation - continent * (1.0 + multiplier)).abs() < 1e-3);
            }
        }
        assert!(clamped > 0, "no sample reached the ocean floor");
        assert!(open_ocean > 0, "no sample above the ocean floor");
    }

    #[test]
    fn test_mask_gates_mountains() {
        let continents = silent_layer();
        let mountains = RidgeNoiseSettings::mountains();
        let mask = SimpleNoiseSettings {
            strength: 3.0,
            vertical_shift: 0.0,
            ..Default::default()
        };
        let mountain_blend = 1.2;
        let packed = height_block(&continents, &mountains, &mask, [5.0, 1.5, 0.5, mountain_blend]);

        let (mut raised, mut masked) = (0, 0);
        for pos in sphere_samples(2048) {
            let ridges = smoothed_ridged_noise(pos, &layer(&packed, 12));
            let mask_value = simple_noise(pos, &layer(&packed, 24));
            let [h, ..] = Kernel::HeightMap.evaluate(&packed, pos);

            if mask_value >= mountain_blend / 2.0 {
                raised += 1;
                assert!((h - (HEIGHT_BASELINE + ridges * ELEVATION_SCALE)).abs() < 1e-4);
            } else if mask_value <= -mountain_blend / 2.0 {
                masked += 1;
                assert_eq!(h, HEIGHT_BASELINE);
            } else {
                assert!(h >= HEIGHT_BASELINE && h <= HEIGHT_BASELINE + ridges * ELEVATION_SCALE + 1e-4);
            }
        }
        assert!(raised > 0 && masked > 0, "raised {raised}, masked {masked}");
    }
}
