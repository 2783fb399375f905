//! Block map keyed by voxel coordinate.

use std::sync::Arc;

use blockworld_core::{BlockRecord, BlockType, VoxelCoord};
use hashbrown::HashMap;
use parking_lot::RwLock;

/// Shared handle to a world.
///
/// Single writer, many readers: block edits take the write lock between
/// ticks, collision queries take the read lock. Swapping the whole map means
/// handing consumers a different handle.
pub type SharedWorld = Arc<RwLock<World>>;

/// Sparse block storage. Coordinates without a record are empty.
#[derive(Debug, Default, Clone)]
pub struct World {
    blocks: HashMap<VoxelCoord, BlockRecord>,
    /// Bumped on every mutation.
    revision: u64,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the world in a shared handle.
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    /// Get the record at a coordinate.
    pub fn get(&self, coord: VoxelCoord) -> Option<&BlockRecord> {
        self.blocks.get(&coord)
    }

    /// Block type at a coordinate; empty cells read as air.
    pub fn block_type(&self, coord: VoxelCoord) -> BlockType {
        self.blocks
            .get(&coord)
            .map_or(BlockType::Air, |record| record.block_type)
    }

    /// Check if a record exists at the given coordinate.
    pub fn contains(&self, coord: VoxelCoord) -> bool {
        self.blocks.contains_key(&coord)
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert(&mut self, coord: VoxelCoord, record: BlockRecord) -> Option<BlockRecord> {
        self.revision += 1;
        self.blocks.insert(coord, record)
    }

    /// Remove the record at a coordinate.
    pub fn remove(&mut self, coord: VoxelCoord) -> Option<BlockRecord> {
        let removed = self.blocks.remove(&coord);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Fill the inclusive box between two corners with copies of `record`.
    pub fn fill(&mut self, from: VoxelCoord, to: VoxelCoord, record: &BlockRecord) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    self.blocks.insert(VoxelCoord::new(x, y, z), record.clone());
                }
            }
        }
        self.revision += 1;
    }

    /// Recompute the stored collision flag of every record.
    ///
    /// Used when a solidity policy changes after records were created.
    /// Returns the number of records whose flag changed.
    pub fn refresh_collision<F>(&mut self, collision_of: F) -> usize
    where
        F: Fn(BlockType) -> bool,
    {
        let mut changed = 0;
        for record in self.blocks.values_mut() {
            let collision = collision_of(record.block_type);
            if record.collision != collision {
                record.collision = collision;
                changed += 1;
            }
        }
        if changed > 0 {
            self.revision += 1;
        }
        changed
    }

    /// Iterate all records.
    pub fn iter(&self) -> impl Iterator<Item = (&VoxelCoord, &BlockRecord)> + '_ {
        self.blocks.iter()
    }

    /// Get the number of stored records.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Mutation counter, useful for logging and staleness checks.
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}
