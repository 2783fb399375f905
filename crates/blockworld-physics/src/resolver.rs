//! Per-axis movement resolution.
//!
//! A requested move is applied one axis at a time in the fixed order X, Z,
//! Y. After each axis the body is re-tested, so a blocked axis does not stop
//! the others: a player walking diagonally into a wall slides along it, and
//! a player walking under a low ceiling keeps moving horizontally while the
//! ceiling blocks the vertical part. Y goes last so vertical settling is
//! decided at the already resolved horizontal position.

use blockworld_core::VoxelCoord;
use blockworld_world::World;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, CONTACT_SKIN, MAX_SWEEP_STEP, MAX_SWEEP_SUBSTEPS};
use crate::detector::{CollisionDetector, OtherPlayer};

/// Which axes were blocked during a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionInfo {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl CollisionInfo {
    /// No axis blocked.
    pub const NONE: Self = Self {
        x: false,
        y: false,
        z: false,
    };

    /// Returns true if any axis was blocked.
    #[inline]
    pub const fn any(self) -> bool {
        self.x || self.y || self.z
    }

    #[inline]
    fn block(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.x = true,
            Axis::Y => self.y = true,
            Axis::Z => self.z = true,
        }
    }
}

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Index into a `Vec3`
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Order in which axes are resolved.
pub const AXIS_ORDER: [Axis; 3] = [Axis::X, Axis::Z, Axis::Y];

/// Turns requested moves into collision-legal positions.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    /// Lowest legal feet position on each axis.
    feet_min: Vec3,
    /// Highest legal feet position on each axis.
    feet_max: Vec3,
    height: f32,
}

impl CollisionResolver {
    /// Create a resolver clamping bodies to the world described by `config`.
    pub fn new(config: &PhysicsConfig) -> Self {
        let half_width = config.half_width();
        let size = config.world_size as f32;
        let feet_min = Vec3::new(half_width, 0.0, half_width);
        let feet_max = Vec3::new(
            size - half_width,
            config.world_height as f32 - config.player_height,
            size - half_width,
        )
        // Keeps clamping total for bodies larger than the world.
        .max(feet_min);
        Self {
            feet_min,
            feet_max,
            height: config.player_height,
        }
    }

    /// Lowest legal feet position.
    pub const fn feet_min(&self) -> Vec3 {
        self.feet_min
    }

    /// Highest legal feet position.
    pub const fn feet_max(&self) -> Vec3 {
        self.feet_max
    }

    /// Whether a body with its feet at `position` is fully inside the world.
    pub fn in_bounds(&self, position: Vec3) -> bool {
        position.is_finite()
            && position.cmpge(self.feet_min).all()
            && position.cmple(self.feet_max).all()
    }

    /// Resolve a move from `old` (assumed collision-free) towards `new`.
    ///
    /// Collides against the detector's stored roster. A blocked axis keeps
    /// its `old` value. The result is always inside the world bounds.
    pub fn resolve_collision(
        &self,
        detector: &CollisionDetector,
        old: Vec3,
        new: Vec3,
    ) -> (Vec3, CollisionInfo) {
        let world = detector.world().read();
        self.resolve(&world, detector, old, new, detector.other_players(), false)
    }

    /// Resolve a move the way authoritative movement does.
    ///
    /// Like [`CollisionResolver::resolve_collision`] against an explicit
    /// roster, except that a vertical move blocked by geometry places the
    /// body flush against the blocking face (landing on a floor, bumping a
    /// ceiling) instead of leaving it at its old height.
    pub fn resolve_movement(
        &self,
        detector: &CollisionDetector,
        old: Vec3,
        new: Vec3,
        others: &[OtherPlayer],
    ) -> (Vec3, CollisionInfo) {
        let world = detector.world().read();
        self.resolve(&world, detector, old, new, others, true)
    }

    /// Clamp a feet position into the world, flagging every changed axis.
    ///
    /// Non-finite coordinates are replaced by the lower bound.
    pub fn clamp_to_bounds(&self, position: Vec3) -> (Vec3, CollisionInfo) {
        let mut info = CollisionInfo::NONE;
        let mut clamped = position;
        for axis in AXIS_ORDER {
            let i = axis.index();
            let value = position[i];
            let bounded = if value.is_finite() {
                value.clamp(self.feet_min[i], self.feet_max[i])
            } else {
                self.feet_min[i]
            };
            if !value.is_finite() || bounded != value {
                clamped[i] = bounded;
                info.block(axis);
            }
        }
        (clamped, info)
    }

    fn resolve(
        &self,
        world: &World,
        detector: &CollisionDetector,
        old: Vec3,
        new: Vec3,
        others: &[OtherPlayer],
        snap: bool,
    ) -> (Vec3, CollisionInfo) {
        let (mut position, mut info) = self.clamp_to_bounds(old);

        for axis in AXIS_ORDER {
            let i = axis.index();
            let target = new[i];
            if !target.is_finite() {
                info.block(axis);
                continue;
            }
            let bounded = target.clamp(self.feet_min[i], self.feet_max[i]);
            if bounded != target {
                info.block(axis);
            }
            if bounded == position[i] {
                continue;
            }

            if Self::sweep_blocked(world, detector, position, axis, bounded, others) {
                info.block(axis);
                if snap && axis == Axis::Y {
                    if let Some(y) =
                        self.contact_height(world, detector, position, bounded, others)
                    {
                        position.y = y;
                    }
                }
            } else {
                position[i] = bounded;
            }
        }

        if info.any() {
            tracing::trace!(
                ?old,
                ?new,
                resolved = ?position,
                x = info.x,
                y = info.y,
                z = info.z,
                "movement blocked"
            );
        }
        (position, info)
    }

    /// Whether moving `position` along `axis` to `target` hits anything.
    ///
    /// The path is tested at steps no longer than [`MAX_SWEEP_STEP`] so a
    /// long move cannot skip over a thin wall.
    fn sweep_blocked(
        world: &World,
        detector: &CollisionDetector,
        position: Vec3,
        axis: Axis,
        target: f32,
        others: &[OtherPlayer],
    ) -> bool {
        let i = axis.index();
        let from = position[i];
        let delta = target - from;
        let steps = (delta.abs() / MAX_SWEEP_STEP).ceil();
        if !steps.is_finite() || steps > MAX_SWEEP_SUBSTEPS as f32 {
            return true;
        }
        let steps = (steps as u32).max(1);

        let mut sample = position;
        for step in 1..=steps {
            sample[i] = if step == steps {
                target
            } else {
                from + delta * (step as f32 / steps as f32)
            };
            if detector.check_collision_in(world, sample, others) {
                return true;
            }
        }
        false
    }

    /// Feet height flush against the first solid face between the current
    /// height and `target_y`, if that resting position is free.
    fn contact_height(
        &self,
        world: &World,
        detector: &CollisionDetector,
        position: Vec3,
        target_y: f32,
        others: &[OtherPlayer],
    ) -> Option<f32> {
        let body = detector.body_aabb(position);
        let (lo, hi) = body.voxel_range();
        let column_solid = |y: i32| {
            (lo.x..=hi.x).any(|x| {
                (lo.z..=hi.z).any(|z| {
                    world
                        .get(VoxelCoord::new(x, y, z))
                        .is_some_and(|record| record.collision)
                })
            })
        };

        let candidate = if target_y < position.y {
            // Falling: highest voxel top at or below the feet.
            let top = (position.y - 0.5).floor() as i32;
            let bottom = (target_y - 0.5).floor() as i32;
            let y = (bottom..=top)
                .rev()
                .take(MAX_SWEEP_SUBSTEPS as usize)
                .find(|&y| column_solid(y))?;
            let resting = y as f32 + 0.5 + CONTACT_SKIN;
            (resting <= position.y).then_some(resting)?
        } else {
            // Rising: lowest voxel bottom at or above the head.
            let head = position.y + self.height;
            let first = (head + 0.5).ceil() as i32;
            let last = (target_y + self.height + 0.5).floor() as i32;
            let y = (first..=last)
                .take(MAX_SWEEP_SUBSTEPS as usize)
                .find(|&y| column_solid(y))?;
            let resting = y as f32 - 0.5 - CONTACT_SKIN - self.height;
            (resting >= position.y).then_some(resting)?
        };

        let resting = Vec3::new(position.x, candidate, position.z);
        (!detector.check_collision_in(world, resting, others)).then_some(candidate)
    }
}
