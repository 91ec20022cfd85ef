//! Ocean shell sizing and lifecycle.

use serde::{Deserialize, Serialize};

use super::HeightRange;
use crate::geometry::{GeometryError, SphereGeometry, SphereMeshCache};

/// Added to the scaled ocean radius so the shell clears coastal triangles.
pub const OCEAN_SHELL_MARGIN: f32 = 0.87;

/// Decides the ocean shell radius for a generated height range.
pub trait OceanShellStrategy {
    fn radius(&self, range: HeightRange, level: f32, body_scale: f32) -> f32;
}

/// `lerp(min, max, level) * body_scale + margin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LerpOceanShell {
    pub margin: f32,
}

impl Default for LerpOceanShell {
    fn default() -> Self {
        Self {
            margin: OCEAN_SHELL_MARGIN,
        }
    }
}

impl OceanShellStrategy for LerpOceanShell {
    fn radius(&self, range: HeightRange, level: f32, body_scale: f32) -> f32 {
        range.lerp(level) * body_scale + self.margin
    }
}

/// A spherical water surface around the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OceanShell {
    pub radius: f32,
    /// Bumped each time the shell is resized in place.
    pub revision: u32,
}

impl OceanShell {
    pub fn new(radius: f32) -> Self {
        Self { radius, revision: 0 }
    }

    /// The shell as a cube-sphere of `resolution` scaled to its radius.
    pub fn geometry(&self, cache: &SphereMeshCache, resolution: u32) -> Result<SphereGeometry, GeometryError> {
        Ok(cache.get(resolution)?.scaled(self.radius))
    }
}

/// Creates, resizes or removes the ocean shell held in `slot`.
pub fn update_ocean_shell(
    slot: &mut Option<OceanShell>,
    strategy: &dyn OceanShellStrategy,
    enabled: bool,
    range: HeightRange,
    level: f32,
    body_scale: f32,
) {
    if !enabled {
        *slot = None;
        return;
    }
    let radius = strategy.radius(range, level, body_scale);
    match slot {
        Some(shell) => {
            shell.radius = radius;
            shell.revision = shell.revision.wrapping_add(1);
        }
        None => *slot = Some(OceanShell::new(radius)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: HeightRange = HeightRange { min: 0.98, max: 1.04 };

    #[test]
    fn test_radius_at_level_bounds() {
        let strategy = LerpOceanShell::default();
        assert!((strategy.radius(RANGE, 0.0, 1.0) - (0.98 + OCEAN_SHELL_MARGIN)).abs() < 1e-6);
        assert!((strategy.radius(RANGE, 1.0, 2.0) - (1.04 * 2.0 + OCEAN_SHELL_MARGIN)).abs() < 1e-6);
    }

    #[test]
    fn test_radius_is_monotonic_in_level() {
        let strategy = LerpOceanShell::default();
        let mut last = f32::MIN;
        for i in 0..=10 {
            let r = strategy.radius(RANGE, i as f32 / 10.0, 1.5);
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn test_update_lifecycle() {
        let strategy = LerpOceanShell::default();
        let mut slot = None;

        update_ocean_shell(&mut slot, &strategy, true, RANGE, 0.5, 1.0);
        let created = slot.expect("shell created");
        assert_eq!(created.revision, 0);

        update_ocean_shell(&mut slot, &strategy, true, RANGE, 1.0, 1.0);
        let resized = slot.expect("shell kept");
        assert_eq!(resized.revision, 1);
        assert!(resized.radius > created.radius);

        update_ocean_shell(&mut slot, &strategy, false, RANGE, 1.0, 1.0);
        assert!(slot.is_none());
    }

    #[test]
    fn test_shell_geometry_is_scaled() {
        let cache = SphereMeshCache::new();
        let shell = OceanShell::new(2.5);
        let geometry = shell.geometry(&cache, 4).unwrap();
        assert!(geometry.vertices.iter().all(|v| (v.length() - 2.5).abs() < 1e-5));
        // The cached unit sphere stays untouched.
        assert!(cache.get(4).unwrap().vertices.iter().all(|v| (v.length() - 1.0).abs() < 1e-5));
    }
}
