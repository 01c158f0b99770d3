//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - The island document store (could swap SQLite -> Mongo)
//! - Snapshot encoding (could swap CBOR -> another region format)
//! - The world template region
//! - Membership resolution (coop lookups + online sessions)
//! - Clock (for testing)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyhold_domain::{IslandId, Membership, WorldSnapshot};

use crate::sessions::PlayerSession;

// =============================================================================
// Error Types
// =============================================================================

/// Store operation errors with context for debugging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Snapshot codec and template errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot decode failed: {0}")]
    Decode(String),
    #[error("Snapshot encode failed: {0}")]
    Encode(String),
    #[error("Template region unavailable: {0}")]
    TemplateIo(String),
}

// =============================================================================
// Store Types
// =============================================================================

/// One island's persisted record.
///
/// Every field is optional: records written by older binaries may carry a
/// version and timestamp but no world blob, and that is a recognized legacy
/// state rather than an error.
#[derive(Debug, Clone, Default)]
pub struct IslandRecord {
    pub data: Option<Vec<u8>>,
    pub last_saved: Option<DateTime<Utc>>,
    pub version: Option<i32>,
}

// =============================================================================
// Persistence Port
// =============================================================================

/// Durable document store for island records.
///
/// Writes are per-field upserts: each field is written independently and
/// idempotently, with no cross-field transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IslandStore: Send + Sync {
    async fn fetch(&self, island: IslandId) -> Result<Option<IslandRecord>, StoreError>;
    async fn put_snapshot(&self, island: IslandId, data: &[u8]) -> Result<(), StoreError>;
    async fn put_last_saved(
        &self,
        island: IslandId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn put_version(&self, island: IslandId, version: i32) -> Result<(), StoreError>;
}

// =============================================================================
// Snapshot Codec Port
// =============================================================================

/// Encodes world snapshots to and from their stored byte form.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotCodec: Send + Sync {
    fn encode(&self, snapshot: &WorldSnapshot) -> Result<Vec<u8>, SnapshotError>;
    fn decode(&self, bytes: &[u8]) -> Result<WorldSnapshot, SnapshotError>;
}

// =============================================================================
// Template Port
// =============================================================================

/// Source of the fixed template region a brand-new island starts from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn materialize(&self) -> Result<WorldSnapshot, SnapshotError>;
}

// =============================================================================
// Membership Port
// =============================================================================

/// Resolves island ownership and the currently online member sessions.
///
/// `online_members` may return an empty list - an island can legitimately be
/// referenced before any member's session data is loaded - and never errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Resolve who owns the island. Called once, at island construction.
    async fn resolve(&self, island: IslandId) -> Membership;

    /// The member sessions currently online for this ownership group.
    fn online_members(&self, membership: &Membership) -> Vec<Arc<PlayerSession>>;
}

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
