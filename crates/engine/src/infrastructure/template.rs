//! Island template region.
//!
//! Brand-new islands start from a fixed template world stored on disk as an
//! encoded snapshot. Loading clips the template to the island's chunk
//! selection radius.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use skyhold_domain::WorldSnapshot;

use crate::infrastructure::ports::{SnapshotCodec, SnapshotError, TemplateSource};

/// Chunk selection radius applied to the template region.
pub const DEFAULT_TEMPLATE_RADIUS: i32 = 3;

pub struct FileTemplateSource {
    path: PathBuf,
    radius: i32,
    codec: Arc<dyn SnapshotCodec>,
}

impl FileTemplateSource {
    pub fn new(path: impl Into<PathBuf>, radius: i32, codec: Arc<dyn SnapshotCodec>) -> Self {
        Self {
            path: path.into(),
            radius,
            codec,
        }
    }
}

#[async_trait]
impl TemplateSource for FileTemplateSource {
    async fn materialize(&self) -> Result<WorldSnapshot, SnapshotError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            SnapshotError::TemplateIo(format!("{}: {}", self.path.display(), e))
        })?;
        let snapshot = self.codec.decode(&bytes)?;
        Ok(snapshot.clipped_to_radius(self.radius))
    }
}
