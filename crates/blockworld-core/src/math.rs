//! Bounding box math.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::VOXEL_HALF;

/// Axis-Aligned Bounding Box.
///
/// Intersection tests treat both boxes as closed intervals, so boxes that
/// only touch on a face are reported as intersecting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create the box of a body standing with its feet at `feet`.
    ///
    /// The box spans `half_width` either side of the feet in X and Z and
    /// rises `height` above them in Y.
    #[inline]
    pub fn from_feet(feet: Vec3, half_width: f32, height: f32) -> Self {
        Self {
            min: Vec3::new(feet.x - half_width, feet.y, feet.z - half_width),
            max: Vec3::new(feet.x + half_width, feet.y + height, feet.z + half_width),
        }
    }

    /// Returns true if both corners are finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Check if a point is inside the AABB
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this AABB
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Inclusive range of voxel coordinates whose cubes intersect this box.
    ///
    /// Voxel `k` spans `[k - 0.5, k + 0.5]`, so it overlaps `[min, max]`
    /// exactly when `ceil(min - 0.5) <= k <= floor(max + 0.5)`. Float to int
    /// casts saturate, so huge boxes yield clamped (possibly empty) ranges
    /// rather than wrapping.
    #[inline]
    pub fn voxel_range(&self) -> (IVec3, IVec3) {
        let lo = (self.min - Vec3::splat(VOXEL_HALF)).ceil();
        let hi = (self.max + Vec3::splat(VOXEL_HALF)).floor();
        (
            IVec3::new(lo.x as i32, lo.y as i32, lo.z as i32),
            IVec3::new(hi.x as i32, hi.y as i32, hi.z as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn feet_anchored_box() {
        let aabb = Aabb::from_feet(Vec3::new(10.0, 5.0, -3.0), 0.3, 1.8);
        assert_relative_eq!(aabb.min.x, 9.7, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.x, 10.3, epsilon = 1e-5);
        assert_relative_eq!(aabb.min.y, 5.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.y, 6.8, epsilon = 1e-5);
        assert_relative_eq!(aabb.min.z, -3.3, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.z, -2.7, epsilon = 1e-5);
    }

    #[test]
    fn aabb_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ZERO));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.5, 0.5)));
    }

    #[test]
    fn touching_faces_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.01, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn voxel_range_uses_closed_intervals() {
        // Feet exactly on the top face of voxel 10 still touch it.
        let touching = Aabb::from_feet(Vec3::new(10.0, 10.5, 10.0), 0.3, 1.8);
        let (lo, hi) = touching.voxel_range();
        assert_eq!(lo, IVec3::new(10, 10, 10));
        assert_eq!(hi, IVec3::new(10, 12, 10));

        let above = Aabb::from_feet(Vec3::new(10.0, 10.9, 10.0), 0.3, 1.8);
        let (lo, _) = above.voxel_range();
        assert_eq!(lo.y, 11);
    }

    #[test]
    fn voxel_range_straddling_block_edge() {
        let aabb = Aabb::from_feet(Vec3::new(10.5, 0.0, 0.0), 0.3, 1.0);
        let (lo, hi) = aabb.voxel_range();
        assert_eq!((lo.x, hi.x), (10, 11));
    }

    #[test]
    fn voxel_range_saturates_for_huge_boxes() {
        let aabb = Aabb::from_feet(Vec3::new(1.0e30, 0.0, 0.0), 0.3, 1.0);
        let (lo, hi) = aabb.voxel_range();
        assert_eq!(lo.x, i32::MAX);
        assert_eq!(hi.x, i32::MAX);
    }

    #[test]
    fn containment() {
        let outer = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        assert!(outer.contains(&Aabb::new(Vec3::ONE, Vec3::splat(2.0))));
        assert!(!outer.contains(&Aabb::new(Vec3::ONE, Vec3::splat(11.0))));
    }
}
