//! Block map storage for the Blockworld voxel server.
//!
//! The world owns every block record. Collision code never copies it; it
//! holds a [`SharedWorld`] handle and reads through the lock.

pub mod world;

pub use world::{SharedWorld, World};
