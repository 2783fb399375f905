//! Voxel coordinates.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::VOXEL_HALF;
use crate::math::Aabb;

/// Integer position of a voxel in the world grid.
///
/// The voxel occupies the unit cube centred on this point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoord {
    /// Create a new voxel coordinate
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Voxel containing a world-space point (rounds half up per axis).
    #[inline]
    pub fn containing(point: Vec3) -> Self {
        let cell = (point + Vec3::splat(VOXEL_HALF)).floor();
        Self::new(cell.x as i32, cell.y as i32, cell.z as i32)
    }

    /// World-space centre of the voxel
    #[inline]
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Bounding box of the voxel cube
    #[inline]
    pub fn aabb(self) -> Aabb {
        let center = self.center();
        let half = Vec3::splat(VOXEL_HALF);
        Aabb::new(center - half, center + half)
    }
}

impl From<IVec3> for VoxelCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<(i32, i32, i32)> for VoxelCoord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}
