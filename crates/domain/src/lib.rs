//! Core domain types for the island lifecycle service: typed identifiers,
//! ownership membership, the world snapshot data model, lifecycle events,
//! and per-player notices. No I/O lives here.

pub mod events;
pub mod ids;
pub mod membership;
pub mod notice;
pub mod snapshot;

pub use events::IslandEvent;
pub use ids::{CoopId, IslandId, ProfileId};
pub use membership::Membership;
pub use notice::PlayerNotice;
pub use snapshot::{
    BlockEdit, BlockId, BlockPos, ChunkColumn, ChunkPos, Position, WorldSnapshot, CHUNK_SIZE,
    CURRENT_FORMAT_VERSION,
};
