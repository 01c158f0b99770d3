//! Periodic vacancy sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::entities::{IslandRegistry, VacancyOutcome};
use crate::sessions::SessionDirectory;

/// Default sweep cadence.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(200);

/// Walks the online players and evicts any of their islands left vacant.
///
/// Islands are only reached through online sessions: an island whose members
/// all disconnect stays materialized until a member returns or a shutdown
/// save-all picks it up.
pub struct VacancySweeper {
    registry: Arc<IslandRegistry>,
    sessions: Arc<SessionDirectory>,
}

impl VacancySweeper {
    pub fn new(registry: Arc<IslandRegistry>, sessions: Arc<SessionDirectory>) -> Self {
        Self { registry, sessions }
    }

    /// One sweep over every online player currently placed in an instance.
    /// Returns how many islands were evicted.
    pub async fn run_once(&self) -> usize {
        let mut evicted = 0;
        for session in self.sessions.online() {
            if !session.is_on_island().await {
                continue;
            }
            // The session's own island, not the one they are standing in.
            let Some(island) = self.registry.lookup(session.island_id) else {
                continue;
            };
            match island.check_vacancy().await {
                Ok(VacancyOutcome::Evicted) => evicted += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        island_id = %island.id(),
                        error = %e,
                        "Vacancy save failed, island stays loaded"
                    );
                }
            }
        }
        evicted
    }

    /// Sweep on a fixed cadence until the returned handle is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}
