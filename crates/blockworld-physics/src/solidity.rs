//! Block solidity policy.

use blockworld_core::{BlockRecord, BlockType, VoxelCoord};
use blockworld_world::World;

use crate::config::PhysicsConfig;

/// Decides which block types stop bodies.
///
/// Air never does, water follows the table's policy flag, and every other
/// type always does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSolidityTable {
    water_solid: bool,
}

impl Default for BlockSolidityTable {
    fn default() -> Self {
        Self { water_solid: true }
    }
}

impl BlockSolidityTable {
    /// Create a table with the given water policy.
    pub const fn new(water_solid: bool) -> Self {
        Self { water_solid }
    }

    /// Create a table from the physics configuration.
    pub const fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.water_collision_enabled)
    }

    /// Current water policy.
    pub const fn water_solid(&self) -> bool {
        self.water_solid
    }

    /// Change the water policy.
    ///
    /// Records already in a world keep their flag until
    /// [`BlockSolidityTable::apply_to`] is called on that world.
    pub fn set_water_collision(&mut self, solid: bool) {
        self.water_solid = solid;
    }

    /// Whether blocks of this type stop bodies.
    pub const fn get_block_collision(&self, block_type: BlockType) -> bool {
        match block_type {
            BlockType::Air => false,
            BlockType::Water => self.water_solid,
            _ => true,
        }
    }

    /// Whether the stored block at `coord` stops bodies. Empty cells do not.
    pub fn get_coord_collision(&self, world: &World, coord: VoxelCoord) -> bool {
        world
            .get(coord)
            .is_some_and(|record| self.get_block_collision(record.block_type))
    }

    /// Build a record, snapshotting the collision flag from the current policy.
    pub fn create_block_data(
        &self,
        block_type: BlockType,
        block_id: Option<String>,
        owner: Option<String>,
    ) -> BlockRecord {
        BlockRecord {
            block_type,
            collision: self.get_block_collision(block_type),
            block_id,
            owner,
        }
    }

    /// Re-snapshot every record of `world` under the current policy.
    ///
    /// Returns the number of records that changed.
    pub fn apply_to(&self, world: &mut World) -> usize {
        world.refresh_collision(|block_type| self.get_block_collision(block_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_never_solid() {
        for water_solid in [true, false] {
            let table = BlockSolidityTable::new(water_solid);
            assert!(!table.get_block_collision(BlockType::Air));
        }
    }

    #[test]
    fn water_follows_policy() {
        let solid = BlockSolidityTable::new(true);
        let passable = BlockSolidityTable::new(false);
        assert!(solid.get_block_collision(BlockType::Water));
        assert!(!passable.get_block_collision(BlockType::Water));
    }

    #[test]
    fn other_types_are_solid() {
        let table = BlockSolidityTable::new(false);
        for ty in BlockType::ALL {
            if !matches!(ty, BlockType::Air | BlockType::Water) {
                assert!(table.get_block_collision(ty), "{ty} should be solid");
            }
        }
    }

    #[test]
    fn missing_coordinate_is_passable() {
        let table = BlockSolidityTable::default();
        let world = World::new();
        assert!(!table.get_coord_collision(&world, VoxelCoord::new(3, 3, 3)));
    }

    #[test]
    fn record_snapshots_policy_at_creation() {
        let mut table = BlockSolidityTable::new(true);
        let record = table.create_block_data(BlockType::Water, Some("w1".into()), None);
        table.set_water_collision(false);

        assert!(record.collision);
        let fresh = table.create_block_data(BlockType::Water, None, None);
        assert!(!fresh.collision);
    }

    #[test]
    fn apply_to_refreshes_existing_water() {
        let mut table = BlockSolidityTable::new(true);
        let mut world = World::new();
        world.insert(
            VoxelCoord::new(0, 0, 0),
            table.create_block_data(BlockType::Water, None, None),
        );
        world.insert(
            VoxelCoord::new(1, 0, 0),
            table.create_block_data(BlockType::Stone, None, None),
        );

        table.set_water_collision(false);
        assert_eq!(table.apply_to(&mut world), 1);
        assert!(!world.get(VoxelCoord::new(0, 0, 0)).unwrap().collision);
    }
}
