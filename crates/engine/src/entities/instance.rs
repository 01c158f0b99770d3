//! A materialized island: the live, mutable world a group plays in.

use std::collections::{HashMap, HashSet};

use skyhold_domain::{
    BlockEdit, BlockId, BlockPos, ChunkPos, IslandId, Position, ProfileId, WorldSnapshot,
};
use tokio::sync::{Mutex, RwLock};

use crate::infrastructure::ports::{SnapshotCodec, SnapshotError};

/// The runtime instance of one island.
///
/// Block writes go into an edit journal rather than straight into the
/// snapshot; `flush_edits` folds the journal in. Reads consult the journal
/// first so players always observe their own edits. Occupancy tracks who is
/// physically standing in this instance right now, which is what the vacancy
/// sweep keys off.
pub struct IslandInstance {
    island_id: IslandId,
    snapshot: RwLock<WorldSnapshot>,
    edits: Mutex<Vec<BlockEdit>>,
    occupants: RwLock<HashMap<ProfileId, Position>>,
    resident_chunks: RwLock<HashSet<ChunkPos>>,
}

impl IslandInstance {
    pub fn new(island_id: IslandId, snapshot: WorldSnapshot) -> Self {
        let resident = snapshot.chunks.keys().copied().collect();
        Self {
            island_id,
            snapshot: RwLock::new(snapshot),
            edits: Mutex::new(Vec::new()),
            occupants: RwLock::new(HashMap::new()),
            resident_chunks: RwLock::new(resident),
        }
    }

    pub fn island_id(&self) -> IslandId {
        self.island_id
    }

    /// Where arriving players are placed.
    pub async fn spawn_point(&self) -> Position {
        self.snapshot.read().await.spawn
    }

    /// Record a block write in the journal.
    pub async fn set_block(&self, pos: BlockPos, block: BlockId) {
        self.edits.lock().await.push(BlockEdit { pos, block });
        self.resident_chunks.write().await.insert(pos.chunk());
    }

    /// Read a block, observing pending journal entries over the snapshot.
    pub async fn block_at(&self, pos: BlockPos) -> Option<BlockId> {
        let journal = self.edits.lock().await;
        if let Some(edit) = journal.iter().rev().find(|edit| edit.pos == pos) {
            return Some(edit.block);
        }
        drop(journal);
        self.snapshot.read().await.block_at(pos)
    }

    /// Fold every pending edit into the snapshot. Returns how many were
    /// applied.
    pub async fn flush_edits(&self) -> usize {
        let mut journal = self.edits.lock().await;
        if journal.is_empty() {
            return 0;
        }
        let drained: Vec<BlockEdit> = journal.drain(..).collect();
        drop(journal);

        let count = drained.len();
        let mut snapshot = self.snapshot.write().await;
        for edit in &drained {
            snapshot.apply(edit);
        }
        count
    }

    pub async fn pending_edit_count(&self) -> usize {
        self.edits.lock().await.len()
    }

    /// Encode the current snapshot. Callers flush the journal first when they
    /// need the encoded bytes to include pending edits.
    pub async fn encode_with(&self, codec: &dyn SnapshotCodec) -> Result<Vec<u8>, SnapshotError> {
        let snapshot = self.snapshot.read().await;
        codec.encode(&snapshot)
    }

    pub async fn admit(&self, profile: ProfileId, position: Position) {
        self.occupants.write().await.insert(profile, position);
    }

    pub async fn remove(&self, profile: ProfileId) {
        self.occupants.write().await.remove(&profile);
    }

    pub async fn contains(&self, profile: ProfileId) -> bool {
        self.occupants.read().await.contains_key(&profile)
    }

    pub async fn occupant_count(&self) -> usize {
        self.occupants.read().await.len()
    }

    pub async fn occupant_profiles(&self) -> Vec<ProfileId> {
        self.occupants.read().await.keys().copied().collect()
    }

    pub async fn resident_chunk_count(&self) -> usize {
        self.resident_chunks.read().await.len()
    }

    /// Release every resident chunk. Called on eviction, after the final
    /// persist has already captured the snapshot.
    pub async fn unload_all(&self) {
        let mut resident = self.resident_chunks.write().await;
        let released = resident.len();
        resident.clear();
        tracing::debug!(
            island_id = %self.island_id,
            chunks = released,
            "Unloaded island chunks"
        );
    }
}
