//! Demo world layout.

use blockworld_core::{BlockType, VoxelCoord};
use blockworld_physics::{BlockSolidityTable, PhysicsConfig, CONTACT_SKIN};
use blockworld_world::World;
use glam::Vec3;

/// Height of the top grass layer.
pub const GROUND_Y: i32 = 8;

/// A flat grass island with a stone wall, a pond and a tree.
pub fn build_world(physics: &PhysicsConfig) -> World {
    let table = BlockSolidityTable::from_config(physics);
    let size = i32::try_from(physics.world_size.min(64)).unwrap_or(64) - 1;
    let mut world = World::new();

    world.fill(
        VoxelCoord::new(0, 0, 0),
        VoxelCoord::new(size, GROUND_Y - 2, size),
        &table.create_block_data(BlockType::Stone, None, None),
    );
    world.fill(
        VoxelCoord::new(0, GROUND_Y - 1, 0),
        VoxelCoord::new(size, GROUND_Y - 1, size),
        &table.create_block_data(BlockType::Dirt, None, None),
    );
    world.fill(
        VoxelCoord::new(0, GROUND_Y, 0),
        VoxelCoord::new(size, GROUND_Y, size),
        &table.create_block_data(BlockType::Grass, None, None),
    );

    // Wall
    world.fill(
        VoxelCoord::new(32, GROUND_Y + 1, 4),
        VoxelCoord::new(32, GROUND_Y + 3, 28),
        &table.create_block_data(BlockType::Stone, Some("wall".into()), None),
    );

    // Pond
    world.fill(
        VoxelCoord::new(10, GROUND_Y - 2, 40),
        VoxelCoord::new(18, GROUND_Y, 48),
        &table.create_block_data(BlockType::Water, Some("pond".into()), None),
    );

    // Tree
    world.fill(
        VoxelCoord::new(48, GROUND_Y + 1, 48),
        VoxelCoord::new(48, GROUND_Y + 4, 48),
        &table.create_block_data(BlockType::Log, None, None),
    );
    world.fill(
        VoxelCoord::new(46, GROUND_Y + 5, 46),
        VoxelCoord::new(50, GROUND_Y + 6, 50),
        &table.create_block_data(BlockType::Leaves, None, None),
    );

    world
}

/// Spawn point of the `index`th demo player, resting on the grass.
pub fn spawn_point(index: usize) -> Vec3 {
    let column = (index % 8) as f32;
    let row = (index / 8) as f32;
    Vec3::new(
        4.0 + column * 3.0,
        GROUND_Y as f32 + 0.5 + CONTACT_SKIN,
        4.0 + row * 3.0,
    )
}
