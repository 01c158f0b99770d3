//! Application state and composition.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::entities::{IslandConfig, IslandContext, IslandRegistry, SaveAllReport};
use crate::infrastructure::{
    clock::SystemClock,
    codec::CborSnapshotCodec,
    event_bus::IslandEventBus,
    membership::SqliteMembershipResolver,
    ports::{ClockPort, IslandStore, MembershipResolver, SnapshotCodec, StoreError, TemplateSource},
    store::SqliteIslandStore,
    template::FileTemplateSource,
};
use crate::sessions::SessionDirectory;
use crate::use_cases::{InteractionRouter, TeleportToIsland, VacancySweeper};

/// Runtime configuration, assembled from the environment by `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database holding island snapshots and coop membership.
    pub db_path: String,
    /// Encoded template snapshot new islands are stamped from.
    pub template_path: PathBuf,
    /// Chunk selection radius applied when clipping the template.
    pub template_radius: i32,
    /// How often the vacancy sweeper checks for empty islands.
    pub sweep_interval: Duration,
    pub island: IslandConfig,
}

/// Main application state.
///
/// Holds the island registry, session directory and use cases.
/// Connection handlers borrow what they need from here.
pub struct App {
    pub registry: Arc<IslandRegistry>,
    pub sessions: Arc<SessionDirectory>,
    pub events: Arc<IslandEventBus>,
    pub teleport: TeleportToIsland,
    pub interactions: InteractionRouter,
    sweeper: Arc<VacancySweeper>,
    sweep_interval: Duration,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub async fn new(config: AppConfig) -> Result<Self, StoreError> {
        let sessions = Arc::new(SessionDirectory::new());
        let events = Arc::new(IslandEventBus::new());

        // Infrastructure services
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let codec: Arc<dyn SnapshotCodec> = Arc::new(CborSnapshotCodec::new());
        let store: Arc<dyn IslandStore> =
            Arc::new(SqliteIslandStore::new(&config.db_path).await?);
        let resolver: Arc<dyn MembershipResolver> = Arc::new(
            SqliteMembershipResolver::new(&config.db_path, sessions.clone()).await?,
        );
        let template: Arc<dyn TemplateSource> = Arc::new(FileTemplateSource::new(
            config.template_path,
            config.template_radius,
            codec.clone(),
        ));

        let ctx = IslandContext {
            store,
            codec,
            template,
            resolver,
            events: events.clone(),
            clock,
            config: config.island,
        };
        let registry = Arc::new(IslandRegistry::new(ctx));

        let teleport = TeleportToIsland::new(registry.clone());
        let sweeper = Arc::new(VacancySweeper::new(registry.clone(), sessions.clone()));

        Ok(Self {
            registry,
            sessions,
            events,
            teleport,
            interactions: InteractionRouter::new(),
            sweeper,
            sweep_interval: config.sweep_interval,
        })
    }

    /// Spawn the long-running background tasks: the vacancy sweeper and the
    /// event logger. Returns the handles so the caller can abort them on
    /// shutdown.
    pub fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.sweeper.clone().spawn(self.sweep_interval),
            self.events.spawn_event_logger(),
        ]
    }

    /// Persist every materialized island without evicting any of them.
    pub async fn force_save_all(&self) -> SaveAllReport {
        self.registry.force_save_all().await
    }
}
