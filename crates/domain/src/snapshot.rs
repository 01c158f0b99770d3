//! World snapshot data model.
//!
//! A snapshot is the decoded, codec-independent spatial content of an island:
//! the spawn point plus every chunk column that holds player-placed blocks.
//! Maps are `BTreeMap` so encoding order is deterministic and a
//! save/load/save cycle reproduces the stored bytes exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current on-disk schema version for island records.
///
/// Records persisted by older binaries carry a smaller number (or none at
/// all, which reads as 0) and are stamped forward on load.
pub const CURRENT_FORMAT_VERSION: i32 = 2;

/// Blocks per chunk edge on the horizontal axes.
pub const CHUNK_SIZE: i32 = 16;

/// A position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0.5, 64.0, 0.5)
    }
}

/// Horizontal chunk coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// True when this chunk lies inside a square selection of the given
    /// radius around the origin.
    pub fn within_radius(&self, radius: i32) -> bool {
        self.x.abs() <= radius && self.z.abs() <= radius
    }
}

/// Integer block coordinates. World-relative unless noted otherwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk this world position falls in.
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::new(self.x.div_euclid(CHUNK_SIZE), self.z.div_euclid(CHUNK_SIZE))
    }

    /// This position translated to chunk-local coordinates.
    pub fn chunk_local(&self) -> BlockPos {
        BlockPos::new(
            self.x.rem_euclid(CHUNK_SIZE),
            self.y,
            self.z.rem_euclid(CHUNK_SIZE),
        )
    }
}

/// Numeric block state identifier. 0 is air.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);

    pub fn is_air(&self) -> bool {
        self.0 == 0
    }
}

/// A single pending block mutation, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEdit {
    pub pos: BlockPos,
    pub block: BlockId,
}

/// One chunk column's blocks, keyed by chunk-local coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkColumn {
    pub blocks: BTreeMap<BlockPos, BlockId>,
}

impl ChunkColumn {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// The full decoded contents of one island world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub spawn: Position,
    pub chunks: BTreeMap<ChunkPos, ChunkColumn>,
}

impl WorldSnapshot {
    pub fn empty(spawn: Position) -> Self {
        Self {
            spawn,
            chunks: BTreeMap::new(),
        }
    }

    /// The block at a world position, if one is recorded there.
    pub fn block_at(&self, pos: BlockPos) -> Option<BlockId> {
        self.chunks
            .get(&pos.chunk())
            .and_then(|column| column.blocks.get(&pos.chunk_local()))
            .copied()
    }

    /// Record a block at a world position, creating the chunk column if
    /// needed. Air overwrites like any other state.
    pub fn set_block(&mut self, pos: BlockPos, block: BlockId) {
        self.chunks
            .entry(pos.chunk())
            .or_default()
            .blocks
            .insert(pos.chunk_local(), block);
    }

    pub fn apply(&mut self, edit: &BlockEdit) {
        self.set_block(edit.pos, edit.block);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Retain only the chunks inside a square radius around the origin.
    /// Template regions ship more chunks than an island uses; loading clips
    /// them to the island's selection radius.
    pub fn clipped_to_radius(mut self, radius: i32) -> Self {
        self.chunks.retain(|pos, _| pos.within_radius(radius));
        self
    }
}

impl Default for WorldSnapshot {
    fn default() -> Self {
        Self::empty(Position::default())
    }
}
