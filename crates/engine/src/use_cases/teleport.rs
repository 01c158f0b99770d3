//! First-spawn placement onto the player's own island.

use std::sync::Arc;

use crate::entities::{IslandRegistry, LoadError};
use crate::sessions::PlayerSession;

/// What a spawn request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportOutcome {
    /// Not a first spawn, or the session is not authenticated yet.
    Skipped,
    /// The player already stood in the island instance.
    AlreadyPresent,
    /// The player was placed at their respawn point.
    Placed,
}

/// Places a player on their own island when they first spawn in.
pub struct TeleportToIsland {
    registry: Arc<IslandRegistry>,
}

impl TeleportToIsland {
    pub fn new(registry: Arc<IslandRegistry>) -> Self {
        Self { registry }
    }

    /// Handle a spawn. A cold spawn waits for the full island load.
    ///
    /// Whichever path placed the player, the readiness gate is flipped
    /// before returning - the last safety net for sessions that connected
    /// between membership resolution and materialization.
    pub async fn execute(
        &self,
        session: &Arc<PlayerSession>,
        first_spawn: bool,
    ) -> Result<TeleportOutcome, LoadError> {
        if !first_spawn || !session.is_authenticated() {
            return Ok(TeleportOutcome::Skipped);
        }

        let island = self.registry.get_or_create(session.island_id).await;
        let instance = island.acquire_instance().await?;

        let already_present = session
            .current_instance()
            .await
            .is_some_and(|current| Arc::ptr_eq(&current, &instance));

        let outcome = if already_present {
            TeleportOutcome::AlreadyPresent
        } else {
            let respawn = session.respawn_point().await;
            session.enter_instance(&instance, respawn).await;
            tracing::debug!(
                profile_id = %session.profile_id,
                island_id = %island.id(),
                "Teleported player to their island"
            );
            TeleportOutcome::Placed
        };

        session.set_ready_for_events();
        Ok(outcome)
    }
}
