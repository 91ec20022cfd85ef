//! Terrain material parameters handed to the renderer.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::terrain::HeightRange;

/// Linear RGBA colours of the terrain bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainColours {
    pub shore_low: Vec4,
    pub shore_high: Vec4,
    pub flat_low: Vec4,
    pub flat_high: Vec4,
    pub steep_low: Vec4,
    pub steep_high: Vec4,
}

impl Default for TerrainColours {
    fn default() -> Self {
        Self {
            shore_low: Vec4::new(0.76, 0.70, 0.50, 1.0),
            shore_high: Vec4::new(0.62, 0.60, 0.38, 1.0),
            flat_low: Vec4::new(0.25, 0.45, 0.16, 1.0),
            flat_high: Vec4::new(0.40, 0.52, 0.22, 1.0),
            steep_low: Vec4::new(0.36, 0.29, 0.22, 1.0),
            steep_high: Vec4::new(0.52, 0.48, 0.45, 1.0),
        }
    }
}

/// Rim lighting of the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FresnelSettings {
    pub colour: Vec4,
    pub strength_near: f32,
    pub strength_far: f32,
    pub power: f32,
}

impl Default for FresnelSettings {
    fn default() -> Self {
        Self {
            colour: Vec4::new(0.55, 0.75, 1.0, 1.0),
            strength_near: 0.2,
            strength_far: 1.0,
            power: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub colours: TerrainColours,
    pub fresnel: FresnelSettings,
}

/// Per-generation material inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainMaterial {
    /// `(min, max)` height multiplier.
    pub height_min_max: Vec2,
    pub ocean_level: f32,
    pub body_scale: f32,
    pub colours: TerrainColours,
    pub fresnel: FresnelSettings,
}

impl TerrainMaterial {
    pub fn new(settings: &MaterialSettings, range: HeightRange, ocean_level: f32, body_scale: f32) -> Self {
        Self {
            height_min_max: Vec2::new(range.min, range.max),
            ocean_level,
            body_scale,
            colours: settings.colours,
            fresnel: settings.fresnel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_carries_generation_values() {
        let range = HeightRange { min: 0.97, max: 1.05 };
        let material = TerrainMaterial::new(&MaterialSettings::default(), range, 0.4, 2.0);
        assert_eq!(material.height_min_max, Vec2::new(0.97, 1.05));
        assert_eq!(material.ocean_level, 0.4);
        assert_eq!(material.body_scale, 2.0);
        assert_eq!(material.colours, TerrainColours::default());
    }
}
