//! Cube-sphere geometry module.
//!
//! Builds the unit-radius base sphere that terrain is displaced from, and the
//! resolution-keyed cache that shares it across generations.

mod cache;
mod face;
mod sphere_mesh;
mod spherify;

use thiserror::Error;

pub use cache::SphereMeshCache;
pub use face::CubeFaceId;
pub use sphere_mesh::SphereGeometry;
pub use spherify::{project_to_sphere, spherify_point};

/// Smallest accepted resolution (vertices per face edge).
pub const MIN_RESOLUTION: u32 = 2;

/// Largest accepted resolution; keeps `6 · N²` comfortably inside `u32` indices.
pub const MAX_RESOLUTION: u32 = 4096;

/// Errors raised while building base geometry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Invalid sphere resolution {0}: expected 2..=4096 vertices per face edge")]
    InvalidResolution(u32),
}

/// Checks that `resolution` lies in `[MIN_RESOLUTION, MAX_RESOLUTION]`.
pub fn check_resolution(resolution: u32) -> Result<(), GeometryError> {
    if (MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
        Ok(())
    } else {
        Err(GeometryError::InvalidResolution(resolution))
    }
}
