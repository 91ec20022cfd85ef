//! Cube-to-sphere projection.
//!
//! Points are first spherified with the analytical mapping (which keeps cell
//! areas far more even than plain normalization near cube corners), then
//! renormalized so every base vertex sits at exactly unit distance.

use glam::Vec3;

/// Transforms a point on the unit cube surface to the unit sphere.
///
/// # Arguments
/// * `cube_pos` - A point on the surface of the `[-1, 1]` cube
///
/// # Example
/// ```
/// use glam::Vec3;
/// use planetgen::geometry::spherify_point;
///
/// let sphere_point = spherify_point(Vec3::new(1.0, 0.5, -0.5));
/// assert!((sphere_point.length() - 1.0).abs() < 1e-5);
/// ```
pub fn spherify_point(cube_pos: Vec3) -> Vec3 {
    let x2 = cube_pos.x * cube_pos.x;
    let y2 = cube_pos.y * cube_pos.y;
    let z2 = cube_pos.z * cube_pos.z;

    Vec3::new(
        cube_pos.x * (1.0 - y2 / 2.0 - z2 / 2.0 + y2 * z2 / 3.0).max(0.0).sqrt(),
        cube_pos.y * (1.0 - x2 / 2.0 - z2 / 2.0 + x2 * z2 / 3.0).max(0.0).sqrt(),
        cube_pos.z * (1.0 - x2 / 2.0 - y2 / 2.0 + x2 * y2 / 3.0).max(0.0).sqrt(),
    )
}

/// Projects a cube-surface point onto the unit sphere, normalized to remove
/// floating point drift from the spherify formula.
pub fn project_to_sphere(cube_pos: Vec3) -> Vec3 {
    spherify_point(cube_pos).normalize()
}
