//! CBOR snapshot codec.
//!
//! Snapshots are stored as CBOR blobs. The domain model keys its maps with
//! `BTreeMap`, so encoding the same snapshot twice yields identical bytes.

use skyhold_domain::WorldSnapshot;

use crate::infrastructure::ports::{SnapshotCodec, SnapshotError};

pub struct CborSnapshotCodec;

impl CborSnapshotCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CborSnapshotCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCodec for CborSnapshotCodec {
    fn encode(&self, snapshot: &WorldSnapshot) -> Result<Vec<u8>, SnapshotError> {
        serde_cbor::to_vec(snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<WorldSnapshot, SnapshotError> {
        serde_cbor::from_slice(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}
