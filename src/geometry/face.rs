//! Cube face identification and per-face parametrization.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identifies one of the six faces of the cube a sphere is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CubeFaceId {
    /// +X face (right)
    PosX = 0,
    /// -X face (left)
    NegX = 1,
    /// +Y face (top)
    PosY = 2,
    /// -Y face (bottom)
    NegY = 3,
    /// +Z face (front)
    PosZ = 4,
    /// -Z face (back)
    NegZ = 5,
}

impl CubeFaceId {
    /// Returns all six cube faces in vertex-buffer order.
    pub const fn all() -> [CubeFaceId; 6] {
        [
            CubeFaceId::PosX,
            CubeFaceId::NegX,
            CubeFaceId::PosY,
            CubeFaceId::NegY,
            CubeFaceId::PosZ,
            CubeFaceId::NegZ,
        ]
    }

    /// Returns the face index (0-5).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the outward face normal and the two in-face axes `(normal, u_axis, v_axis)`.
    ///
    /// The frame is right-handed for every face (`u_axis × v_axis == normal`), so a grid
    /// triangle `(p, p + u, p + v)` always faces away from the cube centre.
    pub const fn frame(self) -> (Vec3, Vec3, Vec3) {
        match self {
            CubeFaceId::PosX => (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            CubeFaceId::NegX => (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            CubeFaceId::PosY => (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            CubeFaceId::NegY => (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            CubeFaceId::PosZ => (Vec3::Z, Vec3::X, Vec3::Y),
            CubeFaceId::NegZ => (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        }
    }

    /// Maps face coordinates `u, v` in `[0, 1]` to a point on the surface of the
    /// `[-1, 1]` cube.
    pub fn uv_to_cube(self, u: f32, v: f32) -> Vec3 {
        let (normal, axis_u, axis_v) = self.frame();
        let s = u * 2.0 - 1.0;
        let t = v * 2.0 - 1.0;
        normal + axis_u * s + axis_v * t
    }
}
