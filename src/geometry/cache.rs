//! Resolution-keyed cache of base sphere geometry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::sphere_mesh::SphereGeometry;
use super::GeometryError;

/// Shared cache of unit cube-sphere meshes keyed by resolution.
///
/// Entries are immutable once inserted. [`SphereMeshCache::get`] always hands out
/// an independent deep copy, so callers may displace or otherwise mutate the
/// returned vertices without affecting the cache or each other.
///
/// Share one cache between generators with `Arc<SphereMeshCache>`.
#[derive(Debug, Default)]
pub struct SphereMeshCache {
    entries: RwLock<HashMap<u32, Arc<SphereGeometry>>>,
}

impl SphereMeshCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a private copy of the unit sphere for `resolution`, building and
    /// caching it on first request.
    pub fn get(&self, resolution: u32) -> Result<SphereGeometry, GeometryError> {
        Ok(self.shared(resolution)?.as_ref().clone())
    }

    /// Returns the cached entry itself, building it on first request.
    fn shared(&self, resolution: u32) -> Result<Arc<SphereGeometry>, GeometryError> {
        if let Some(entry) = self.entries.read().get(&resolution) {
            return Ok(Arc::clone(entry));
        }

        // Build outside the lock; a concurrent builder for the same resolution
        // produces an identical mesh and the first insert wins.
        let built = Arc::new(SphereGeometry::new(resolution)?);
        let mut entries = self.entries.write();
        let entry = entries.entry(resolution).or_insert_with(|| {
            debug!(
                resolution,
                vertices = built.vertex_count(),
                triangles = built.triangle_count(),
                "cached sphere geometry"
            );
            Arc::clone(&built)
        });
        Ok(Arc::clone(entry))
    }

    /// Number of distinct resolutions cached.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns true if `resolution` has already been built.
    pub fn contains(&self, resolution: u32) -> bool {
        self.entries.read().contains_key(&resolution)
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
