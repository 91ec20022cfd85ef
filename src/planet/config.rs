//! Configuration for planet generation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MaterialSettings;
use crate::geometry::{MAX_RESOLUTION, MIN_RESOLUTION};
use crate::noise::MAX_NOISE_LAYERS;
use crate::terrain::{ShadingSettings, ShapeSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Resolution {0} is outside 2..=4096")]
    InvalidResolution(u32),
    #[error("Ocean level {0} is outside [0, 1]")]
    OceanLevelOutOfRange(f32),
    #[error("Body scale {0} must be finite and positive")]
    InvalidBodyScale(f32),
    #[error("Ocean parameter '{0}' is not finite")]
    NonFiniteOcean(&'static str),
    #[error("Noise layer '{layer}' has {num_layers} octaves, at most 16 are evaluated")]
    TooManyLayers { layer: &'static str, num_layers: u32 },
    #[error("Noise layer '{0}' has a non-finite parameter")]
    NonFiniteLayer(&'static str),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ocean surface and ocean-floor shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanSettings {
    /// Whether an ocean shell is produced.
    pub enabled: bool,
    /// Fraction between the lowest (0) and highest (1) terrain height.
    pub level: f32,
    /// Extra depth multiplier applied below sea level.
    pub depth_multiplier: f32,
    /// Depth of the flattened ocean floor in noise units.
    pub floor_depth: f32,
    /// Blend width between continents and ocean floor.
    pub floor_smoothing: f32,
    /// Width of the mountain mask transition.
    pub mountain_blend: f32,
}

impl Default for OceanSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: 0.5,
            depth_multiplier: 5.0,
            floor_depth: 1.5,
            floor_smoothing: 0.5,
            mountain_blend: 1.2,
        }
    }
}

/// Everything one generation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    /// Seed for the shape layer offsets.
    pub seed: u64,
    /// Vertices per cube-face edge.
    pub resolution: u32,
    /// Scale applied to the unit planet when sizing the ocean.
    pub body_scale: f32,
    pub ocean: OceanSettings,
    pub shape: ShapeSettings,
    /// `None` leaves the shading channel zeroed.
    pub shading: Option<ShadingSettings>,
    pub material: MaterialSettings,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            resolution: 64,
            body_scale: 1.0,
            ocean: OceanSettings::default(),
            shape: ShapeSettings::default(),
            shading: Some(ShadingSettings::default()),
            material: MaterialSettings::default(),
        }
    }
}

impl PlanetConfig {
    /// Creates a configuration suitable for Earth-like planets.
    pub fn earth_like(seed: u64) -> Self {
        Self {
            seed,
            resolution: 128,
            ocean: OceanSettings {
                level: 0.55,
                ..Default::default()
            },
            shading: Some(ShadingSettings {
                seed,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// A featureless sphere: every shape layer at zero strength.
    pub fn flat(seed: u64) -> Self {
        Self {
            seed,
            shape: ShapeSettings::flat(),
            ..Default::default()
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks value ranges before any work is done.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&self.resolution) {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }
        if !(0.0..=1.0).contains(&self.ocean.level) {
            return Err(ConfigError::OceanLevelOutOfRange(self.ocean.level));
        }
        if !self.body_scale.is_finite() || self.body_scale <= 0.0 {
            return Err(ConfigError::InvalidBodyScale(self.body_scale));
        }
        let ocean = [
            ("depth_multiplier", self.ocean.depth_multiplier),
            ("floor_depth", self.ocean.floor_depth),
            ("floor_smoothing", self.ocean.floor_smoothing),
            ("mountain_blend", self.ocean.mountain_blend),
        ];
        if let Some(&(name, _)) = ocean.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFiniteOcean(name));
        }

        check_layers("shape", self.shape.max_layers(), self.shape.layers_valid())?;
        if let Some(shading) = &self.shading {
            check_layers("shading", shading.max_layers(), shading.layers_valid())?;
        }
        Ok(())
    }
}

fn check_layers(layer: &'static str, num_layers: u32, finite: bool) -> Result<(), ConfigError> {
    if num_layers > MAX_NOISE_LAYERS {
        return Err(ConfigError::TooManyLayers { layer, num_layers });
    }
    if !finite {
        return Err(ConfigError::NonFiniteLayer(layer));
    }
    Ok(())
}
