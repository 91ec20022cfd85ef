//! Authored noise-layer settings and their packed kernel representation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::compute::KernelParams;
use crate::random::Prng;

/// Floats occupied by one noise layer in a kernel's parameter block (three vec4s).
pub const NOISE_PARAM_FLOATS: usize = 12;

/// Upper bound on octaves per layer; kernels clamp to the same value.
pub const MAX_NOISE_LAYERS: u32 = 16;

/// Magnitude of the seed-derived phase offset applied to every layer.
const SEEDED_OFFSET_RANGE: f32 = 10_000.0;

/// A noise layer that can push its numeric parameters into a compute context.
pub trait NoiseLayer {
    /// Packs the layer into its kernel layout, drawing the phase offset from `prng`.
    fn pack(&self, prng: &mut Prng) -> [f32; NOISE_PARAM_FLOATS];

    /// Writes the packed layer into `params` under `name`.
    fn set_compute_values(&self, params: &mut KernelParams, prng: &mut Prng, name: &str) {
        let packed = self.pack(prng);
        params.set_floats(name, &packed);
    }
}

/// Draws a seed-dependent phase offset. Consumes exactly four values from `prng`.
fn seeded_offset(prng: &mut Prng) -> Vec3 {
    let direction = Vec3::new(prng.next_f32(), prng.next_f32(), prng.next_f32());
    direction * prng.next_f32() * SEEDED_OFFSET_RANGE
}

/// Plain fractal simplex noise layer (continents, masks, shading detail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleNoiseSettings {
    /// Number of octaves summed.
    pub num_layers: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude multiplier per octave.
    pub persistence: f32,
    /// Base frequency.
    pub scale: f32,
    /// Output multiplier; zero flattens the layer to `vertical_shift`.
    pub strength: f32,
    /// Constant added after scaling.
    pub vertical_shift: f32,
    /// Authored phase offset added to the seeded one.
    pub offset: Vec3,
}

impl Default for SimpleNoiseSettings {
    fn default() -> Self {
        Self {
            num_layers: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            scale: 1.0,
            strength: 1.0,
            vertical_shift: 0.0,
            offset: Vec3::ZERO,
        }
    }
}

impl SimpleNoiseSettings {
    /// Large-scale landmass shape.
    pub fn continents() -> Self {
        Self {
            num_layers: 6,
            lacunarity: 1.9,
            persistence: 0.5,
            scale: 0.9,
            strength: 8.0,
            vertical_shift: 0.4,
            offset: Vec3::ZERO,
        }
    }

    /// Low-frequency mask selecting where mountain ridges appear.
    pub fn mountain_mask() -> Self {
        Self {
            num_layers: 3,
            lacunarity: 2.0,
            persistence: 0.5,
            scale: 1.2,
            strength: 1.0,
            vertical_shift: -0.2,
            offset: Vec3::ZERO,
        }
    }

    /// Returns a copy with a different strength.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub(crate) fn is_finite(&self) -> bool {
        [
            self.lacunarity,
            self.persistence,
            self.scale,
            self.strength,
            self.vertical_shift,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.offset.is_finite()
    }
}

impl NoiseLayer for SimpleNoiseSettings {
    fn pack(&self, prng: &mut Prng) -> [f32; NOISE_PARAM_FLOATS] {
        let offset = seeded_offset(prng) + self.offset;
        [
            offset.x,
            offset.y,
            offset.z,
            self.num_layers as f32,
            self.persistence,
            self.lacunarity,
            self.scale,
            self.strength,
            self.vertical_shift,
            0.0,
            0.0,
            0.0,
        ]
    }
}

/// Ridged (turbulence) noise layer used for mountain ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeNoiseSettings {
    pub num_layers: u32,
    pub lacunarity: f32,
    pub persistence: f32,
    pub scale: f32,
    /// Exponent sharpening each ridge.
    pub power: f32,
    pub strength: f32,
    /// How strongly one octave's ridges gate the next.
    pub gain: f32,
    pub vertical_shift: f32,
    /// Sampling radius (in hundredths of the unit sphere) used to soften peaks.
    pub peak_smoothing: f32,
    pub offset: Vec3,
}

impl Default for RidgeNoiseSettings {
    fn default() -> Self {
        Self {
            num_layers: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            scale: 1.0,
            power: 2.0,
            strength: 1.0,
            gain: 1.0,
            vertical_shift: 0.0,
            peak_smoothing: 0.0,
            offset: Vec3::ZERO,
        }
    }
}

impl RidgeNoiseSettings {
    /// Sharp, sparse mountain ranges.
    pub fn mountains() -> Self {
        Self {
            num_layers: 5,
            lacunarity: 4.0,
            persistence: 0.5,
            scale: 1.5,
            power: 3.0,
            strength: 12.0,
            gain: 1.2,
            vertical_shift: 0.0,
            peak_smoothing: 1.0,
            offset: Vec3::ZERO,
        }
    }

    /// Returns a copy with a different strength.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub(crate) fn is_finite(&self) -> bool {
        [
            self.lacunarity,
            self.persistence,
            self.scale,
            self.power,
            self.strength,
            self.gain,
            self.vertical_shift,
            self.peak_smoothing,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.offset.is_finite()
    }
}

impl NoiseLayer for RidgeNoiseSettings {
    fn pack(&self, prng: &mut Prng) -> [f32; NOISE_PARAM_FLOATS] {
        let offset = seeded_offset(prng) + self.offset;
        [
            offset.x,
            offset.y,
            offset.z,
            self.num_layers as f32,
            self.persistence,
            self.lacunarity,
            self.scale,
            self.strength,
            self.power,
            self.gain,
            self.vertical_shift,
            self.peak_smoothing,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pack_layout() {
        let settings = SimpleNoiseSettings {
            num_layers: 3,
            lacunarity: 2.5,
            persistence: 0.4,
            scale: 1.5,
            strength: 0.7,
            vertical_shift: -0.1,
            offset: Vec3::new(1.0, 2.0, 3.0),
        };
        let packed = settings.pack(&mut Prng::new(9));
        assert_eq!(packed[3], 3.0);
        assert_eq!(&packed[4..9], &[0.4, 2.5, 1.5, 0.7, -0.1]);
        assert_eq!(&packed[9..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ridge_pack_layout() {
        let settings = RidgeNoiseSettings::mountains();
        let packed = settings.pack(&mut Prng::new(9));
        assert_eq!(packed[3], 5.0);
        assert_eq!(&packed[4..8], &[0.5, 4.0, 1.5, 12.0]);
        assert_eq!(&packed[8..], &[3.0, 1.2, 0.0, 1.0]);
    }

    #[test]
    fn test_offset_is_seeded() {
        let layer = SimpleNoiseSettings::default();
        let a = layer.pack(&mut Prng::new(1));
        let b = layer.pack(&mut Prng::new(1));
        let c = layer.pack(&mut Prng::new(2));
        assert_eq!(a, b);
        assert_ne!(a[..3], c[..3]);
        assert!(a[..3].iter().all(|v| (0.0..SEEDED_OFFSET_RANGE).contains(v)));
    }

    #[test]
    fn test_layers_consume_shared_stream() {
        // Two layers drawn from one stream must not share a phase offset.
        let layer = SimpleNoiseSettings::default();
        let mut prng = Prng::new(77);
        let first = layer.pack(&mut prng);
        let second = layer.pack(&mut prng);
        assert_ne!(first[..3], second[..3]);
    }

    #[test]
    fn test_authored_offset_added() {
        let base = SimpleNoiseSettings::default();
        let shifted = SimpleNoiseSettings {
            offset: Vec3::new(10.0, 0.0, -5.0),
            ..base.clone()
        };
        let a = base.pack(&mut Prng::new(3));
        let b = shifted.pack(&mut Prng::new(3));
        assert!((b[0] - a[0] - 10.0).abs() < 1e-2);
        assert_eq!(b[1], a[1]);
        assert!((b[2] - a[2] + 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_set_compute_values_binds_name() {
        let mut params = KernelParams::new();
        RidgeNoiseSettings::default().set_compute_values(&mut params, &mut Prng::new(0), "noise_params_mountains");
        assert_eq!(params.get("noise_params_mountains").map(|v| v.len()), Some(NOISE_PARAM_FLOATS));
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let settings: SimpleNoiseSettings = serde_json::from_str(r#"{"strength": 0.0}"#).unwrap();
        assert_eq!(settings.strength, 0.0);
        assert_eq!(settings.num_layers, SimpleNoiseSettings::default().num_layers);
    }
}
