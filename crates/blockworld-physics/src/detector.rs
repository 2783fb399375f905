//! Body versus world and body versus body collision queries.

use std::sync::Arc;

use blockworld_core::{Aabb, BlockType, VoxelCoord};
use blockworld_world::{SharedWorld, World};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;

/// Another player's body as seen by a collision query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OtherPlayer {
    /// Feet position
    pub position: Vec3,
    /// Half-extent of the body in X and Z
    pub size: f32,
    /// Height of the body above its feet
    pub height: f32,
}

impl OtherPlayer {
    /// Create a roster entry
    pub const fn new(position: Vec3, size: f32, height: f32) -> Self {
        Self {
            position,
            size,
            height,
        }
    }

    /// Bounding box of the body
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_feet(self.position, self.size, self.height)
    }
}

/// Answers "does a player body at this position overlap anything solid".
///
/// Holds a handle to the live world rather than a copy, so block edits are
/// visible to the very next query.
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    world: SharedWorld,
    half_width: f32,
    height: f32,
    others: Vec<OtherPlayer>,
}

impl CollisionDetector {
    /// Bind a detector to a world, sizing bodies from `config`.
    pub fn new(world: SharedWorld, config: &PhysicsConfig) -> Self {
        Self {
            world,
            half_width: config.half_width(),
            height: config.player_height,
            others: Vec::new(),
        }
    }

    /// The world handle currently queried.
    pub const fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// Swap the world handle. Takes effect for the next query.
    pub fn update_world(&mut self, world: SharedWorld) {
        if !Arc::ptr_eq(&self.world, &world) {
            tracing::debug!(
                revision = world.read().revision(),
                "collision detector bound to a new world"
            );
        }
        self.world = world;
    }

    /// Replace the stored roster of other players.
    pub fn set_other_players(&mut self, others: Vec<OtherPlayer>) {
        self.others = others;
    }

    /// The stored roster of other players.
    pub fn other_players(&self) -> &[OtherPlayer] {
        &self.others
    }

    /// Player half-width in X and Z.
    pub const fn half_width(&self) -> f32 {
        self.half_width
    }

    /// Player height.
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Bounding box of the queried player's body at `position`.
    #[inline]
    pub fn body_aabb(&self, position: Vec3) -> Aabb {
        Aabb::from_feet(position, self.half_width, self.height)
    }

    /// True iff the body at `position` overlaps any solid voxel.
    ///
    /// Non-finite positions always collide.
    pub fn check_block_collision(&self, position: Vec3) -> bool {
        let world = self.world.read();
        self.check_block_collision_in(&world, position)
    }

    /// True iff the body at `position` overlaps at least one of `others`.
    ///
    /// The caller is responsible for leaving the queried player out of the
    /// roster.
    pub fn check_player_collision(&self, position: Vec3, others: &[OtherPlayer]) -> bool {
        if !position.is_finite() {
            return true;
        }
        let body = self.body_aabb(position);
        others.iter().any(|other| body.intersects(&other.aabb()))
    }

    /// Block collision or player collision.
    ///
    /// `None` checks against the stored roster.
    pub fn check_collision(&self, position: Vec3, others: Option<&[OtherPlayer]>) -> bool {
        let world = self.world.read();
        self.check_collision_in(&world, position, others.unwrap_or(&self.others))
    }

    /// First solid voxel overlapped by the body at `position`, if any.
    pub fn blocking_voxel(&self, position: Vec3) -> Option<(VoxelCoord, BlockType)> {
        let world = self.world.read();
        self.blocking_voxel_in(&world, position)
    }

    /// [`CollisionDetector::check_block_collision`] against an already locked world.
    pub fn check_block_collision_in(&self, world: &World, position: Vec3) -> bool {
        !position.is_finite() || self.blocking_voxel_in(world, position).is_some()
    }

    /// [`CollisionDetector::check_collision`] against an already locked world.
    pub fn check_collision_in(
        &self,
        world: &World,
        position: Vec3,
        others: &[OtherPlayer],
    ) -> bool {
        self.check_block_collision_in(world, position)
            || self.check_player_collision(position, others)
    }

    /// [`CollisionDetector::blocking_voxel`] against an already locked world.
    pub fn blocking_voxel_in(
        &self,
        world: &World,
        position: Vec3,
    ) -> Option<(VoxelCoord, BlockType)> {
        if !position.is_finite() {
            return None;
        }
        first_solid_in_box(world, &self.body_aabb(position))
    }
}

/// Scan every voxel overlapped by `aabb`, returning the first solid one.
pub(crate) fn first_solid_in_box(world: &World, aabb: &Aabb) -> Option<(VoxelCoord, BlockType)> {
    if world.is_empty() {
        return None;
    }
    let (lo, hi) = aabb.voxel_range();
    for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                let coord = VoxelCoord::new(x, y, z);
                if let Some(record) = world.get(coord) {
                    if record.collision {
                        return Some((coord, record.block_type));
                    }
                }
            }
        }
    }
    None
}
