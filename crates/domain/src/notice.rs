//! Per-player system notices.
//!
//! Small typed messages pushed to an individual player's session channel,
//! as opposed to [`crate::events::IslandEvent`] which fans out to subsystem
//! subscribers.

use serde::{Deserialize, Serialize};

/// A message addressed to one player's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerNotice {
    /// The player's island record was stamped forward to a newer format
    /// version while loading.
    IslandMigrated { from: i32, to: i32 },
}
