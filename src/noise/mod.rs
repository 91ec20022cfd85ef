//! Layered noise configuration and reference evaluation.
//!
//! Settings structs describe authored layers and pack themselves into compute
//! kernel parameter blocks; `sample` evaluates the same packed blocks on the host.

mod sample;
mod settings;

pub use sample::{blend, ridged_noise, simple_noise, simplex, smooth_max, smooth_min, smoothed_ridged_noise};
pub use settings::{NoiseLayer, RidgeNoiseSettings, SimpleNoiseSettings, MAX_NOISE_LAYERS, NOISE_PARAM_FLOATS};
