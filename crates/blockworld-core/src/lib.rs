//! Core types and math for the Blockworld voxel server.
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Block types and block records
//! - Voxel coordinates and the world-space convention they follow
//! - Axis-aligned bounding boxes for bodies and voxel cells
//! - The shared error type

pub mod coords;
pub mod error;
pub mod math;
pub mod types;

pub use coords::VoxelCoord;
pub use error::{Error, Result};
pub use math::Aabb;
pub use types::{BlockRecord, BlockType};

/// Engine-wide constants
pub mod constants {
    /// Half the edge length of a voxel. Voxel `(x, y, z)` is centred on the
    /// integer point, so it spans `x - VOXEL_HALF ..= x + VOXEL_HALF`.
    pub const VOXEL_HALF: f32 = 0.5;
}
