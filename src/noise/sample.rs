//! Host-side evaluation of the noise primitives used by the terrain kernels.
//!
//! These mirror the WGSL functions in `compute/wgpu/shaders/noise.wgsl` and
//! read the same packed parameter blocks. Simplex values come from simdnoise,
//! so reference and GPU results agree in shape but not bit-for-bit.

use glam::Vec3;
use simdnoise::NoiseBuilder;

use super::settings::{MAX_NOISE_LAYERS, NOISE_PARAM_FLOATS};

/// Seed for the reference simplex lattice; phase variation comes from layer offsets.
const SIMPLEX_SEED: i32 = 0;

/// simdnoise returns the raw kernel sum of its 3D simplex; FastNoise's output
/// normalization brings it to unit amplitude.
const SIMPLEX_AMPLITUDE: f32 = 32.0;

/// Single-octave 3D simplex noise in `[-1, 1]`.
pub fn simplex(pos: Vec3) -> f32 {
    let raw = NoiseBuilder::fbm_3d_offset(pos.x, 1, pos.y, 1, pos.z, 1)
        .with_seed(SIMPLEX_SEED)
        .with_freq(1.0)
        .with_octaves(1)
        .generate()
        .0[0];
    (raw * SIMPLEX_AMPLITUDE).clamp(-1.0, 1.0)
}

fn layer_count(packed: f32) -> u32 {
    (packed.max(0.0) as u32).min(MAX_NOISE_LAYERS)
}

/// Fractal simplex sum of a packed [`SimpleNoiseSettings`](super::SimpleNoiseSettings) layer.
pub fn simple_noise(pos: Vec3, params: &[f32; NOISE_PARAM_FLOATS]) -> f32 {
    let offset = Vec3::new(params[0], params[1], params[2]);
    let num_layers = layer_count(params[3]);
    let persistence = params[4];
    let lacunarity = params[5];
    let scale = params[6];
    let strength = params[7];
    let vertical_shift = params[8];

    let mut noise_sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = scale;
    for _ in 0..num_layers {
        noise_sum += simplex(pos * frequency + offset) * amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }
    noise_sum * strength + vertical_shift
}

/// Ridged multifractal of a packed [`RidgeNoiseSettings`](super::RidgeNoiseSettings) layer.
pub fn ridged_noise(pos: Vec3, params: &[f32; NOISE_PARAM_FLOATS]) -> f32 {
    let offset = Vec3::new(params[0], params[1], params[2]);
    let num_layers = layer_count(params[3]);
    let persistence = params[4];
    let lacunarity = params[5];
    let scale = params[6];
    let strength = params[7];
    let power = params[8];
    let gain = params[9];
    let vertical_shift = params[10];

    let mut noise_sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = scale;
    let mut ridge_weight = 1.0;
    for _ in 0..num_layers {
        let mut value = 1.0 - simplex(pos * frequency + offset).abs();
        value = value.abs().powf(power);
        value *= ridge_weight;
        ridge_weight = (value * gain).clamp(0.0, 1.0);
        noise_sum += value * amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }
    noise_sum * strength + vertical_shift
}

/// Ridged noise averaged over a small cross of samples to round off peaks.
pub fn smoothed_ridged_noise(pos: Vec3, params: &[f32; NOISE_PARAM_FLOATS]) -> f32 {
    let sphere_normal = pos.normalize_or_zero();
    let axis_a = sphere_normal.cross(Vec3::Y);
    let axis_b = sphere_normal.cross(axis_a);
    let offset_dst = params[11] * 0.01;

    let samples = [
        ridged_noise(pos, params),
        ridged_noise(pos - axis_a * offset_dst, params),
        ridged_noise(pos + axis_a * offset_dst, params),
        ridged_noise(pos - axis_b * offset_dst, params),
        ridged_noise(pos + axis_b * offset_dst, params),
    ];
    samples.iter().sum::<f32>() / samples.len() as f32
}

/// Polynomial smooth minimum; `k` is the blend width. Exact `min` when `k <= 0`.
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = ((b - a + k) / (2.0 * k)).clamp(0.0, 1.0);
    a * h + b * (1.0 - h) - k * h * (1.0 - h)
}

/// Polynomial smooth maximum; `k` is the blend width. Exact `max` when `k <= 0`.
pub fn smooth_max(a: f32, b: f32, k: f32) -> f32 {
    -smooth_min(-a, -b, k)
}

/// Smoothstep from 0 to 1 across `[start - width / 2, start + width / 2]`.
pub fn blend(start: f32, width: f32, x: f32) -> f32 {
    if width <= 0.0 {
        return if x < start { 0.0 } else { 1.0 };
    }
    let t = ((x - (start - width / 2.0)) / width).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
