//! Block types and block records.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of block stored in a voxel.
///
/// The numeric id of `Air` is 0 and is reserved for empty space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum BlockType {
    /// Empty space
    #[default]
    Air = 0,
    Stone = 1,
    Dirt = 2,
    Grass = 3,
    Snow = 4,
    Sand = 5,
    /// Water; its solidity is a runtime policy, not a property of the type
    Water = 6,
    /// Tree log block
    Log = 7,
    /// Tree leaves block
    Leaves = 8,
    Flower = 9,
}

impl BlockType {
    /// Every known block type, in id order.
    pub const ALL: [Self; 10] = [
        Self::Air,
        Self::Stone,
        Self::Dirt,
        Self::Grass,
        Self::Snow,
        Self::Sand,
        Self::Water,
        Self::Log,
        Self::Leaves,
        Self::Flower,
    ];

    /// Numeric id of the type
    #[inline]
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Lowercase name of the type
    pub const fn name(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Stone => "stone",
            Self::Dirt => "dirt",
            Self::Grass => "grass",
            Self::Snow => "snow",
            Self::Sand => "sand",
            Self::Water => "water",
            Self::Log => "log",
            Self::Leaves => "leaves",
            Self::Flower => "flower",
        }
    }

    /// Returns true if this block is air (empty)
    #[inline]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }
}

impl TryFrom<u16> for BlockType {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or_else(|| Error::UnknownBlockType(id.to_string()))
    }
}

impl FromStr for BlockType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ty| ty.name() == wanted)
            .ok_or_else(|| Error::UnknownBlockType(s.to_string()))
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A block stored in the world map.
///
/// `collision` is decided once, when the record is created, and travels with
/// the record from then on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// The block type
    pub block_type: BlockType,
    /// Whether the block stops bodies
    pub collision: bool,
    /// Optional persistent identifier assigned by the world
    pub block_id: Option<String>,
    /// Player that placed the block, if any
    pub owner: Option<String>,
}

impl BlockRecord {
    /// Create a record with an explicit collision flag
    #[inline]
    pub const fn new(block_type: BlockType, collision: bool) -> Self {
        Self {
            block_type,
            collision,
            block_id: None,
            owner: None,
        }
    }

    /// Attach a block identifier
    pub fn with_block_id(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    /// Attach an owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}
