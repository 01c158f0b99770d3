//! Shared fixtures for engine tests: in-memory collaborators and a wired-up
//! harness so island tests never touch SQLite or the filesystem.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use skyhold_domain::{
    BlockId, BlockPos, IslandId, Membership, PlayerNotice, Position, ProfileId, WorldSnapshot,
};
use tokio::sync::mpsc;

use crate::entities::island::Island;
use crate::entities::registry::{IslandConfig, IslandContext};
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::codec::CborSnapshotCodec;
use crate::infrastructure::event_bus::IslandEventBus;
use crate::infrastructure::ports::{
    IslandRecord, MembershipResolver, SnapshotCodec, SnapshotError, TemplateSource,
};
use crate::infrastructure::store::InMemoryIslandStore;
use crate::sessions::{PlayerSession, SessionDirectory};

/// A small template world: a spawn platform of two blocks.
pub fn template_snapshot() -> WorldSnapshot {
    let mut snapshot = WorldSnapshot::empty(Position::new(0.5, 65.0, 0.5));
    snapshot.set_block(BlockPos::new(0, 64, 0), BlockId(1));
    snapshot.set_block(BlockPos::new(1, 64, 0), BlockId(2));
    snapshot
}

/// The fixed instant every harness clock reports.
pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Template source that counts materializations and can be told to fail.
pub struct CountingTemplate {
    snapshot: WorldSnapshot,
    calls: AtomicUsize,
    fail_next: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingTemplate {
    pub fn new(snapshot: WorldSnapshot) -> Self {
        Self {
            snapshot,
            calls: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next `n` materializations fail before succeeding again.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateSource for CountingTemplate {
    async fn materialize(&self) -> Result<WorldSnapshot, SnapshotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(SnapshotError::TemplateIo("template region offline".into()));
        }
        Ok(self.snapshot.clone())
    }
}

/// Membership resolver over in-memory coop seeds, with online lookup backed
/// by a real session directory. Unseeded islands resolve to single-owner.
pub struct FakeResolver {
    coops: DashMap<IslandId, Membership>,
    sessions: Arc<SessionDirectory>,
    resolve_calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new(sessions: Arc<SessionDirectory>) -> Self {
        Self {
            coops: DashMap::new(),
            sessions,
            resolve_calls: AtomicUsize::new(0),
        }
    }

    pub fn seed_coop(&self, membership: Membership) {
        self.coops.insert(membership.island_id(), membership);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipResolver for FakeResolver {
    async fn resolve(&self, island: IslandId) -> Membership {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.coops
            .get(&island)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Membership::single_owner(island.owner_profile()))
    }

    fn online_members(&self, membership: &Membership) -> Vec<Arc<PlayerSession>> {
        membership
            .member_profiles()
            .iter()
            .filter_map(|profile| self.sessions.get(*profile))
            .collect()
    }
}

/// One fully wired island environment over in-memory collaborators.
pub struct Harness {
    pub store: Arc<InMemoryIslandStore>,
    pub codec: Arc<CborSnapshotCodec>,
    pub template: Arc<CountingTemplate>,
    pub sessions: Arc<SessionDirectory>,
    pub resolver: Arc<FakeResolver>,
    pub events: Arc<IslandEventBus>,
    pub clock: Arc<FixedClock>,
    pub config: IslandConfig,
}

impl Harness {
    pub fn new() -> Self {
        let sessions = Arc::new(SessionDirectory::new());
        Self {
            store: Arc::new(InMemoryIslandStore::new()),
            codec: Arc::new(CborSnapshotCodec::new()),
            template: Arc::new(CountingTemplate::new(template_snapshot())),
            resolver: Arc::new(FakeResolver::new(Arc::clone(&sessions))),
            sessions,
            events: Arc::new(IslandEventBus::new()),
            clock: Arc::new(FixedClock(test_time())),
            config: IslandConfig::default(),
        }
    }

    pub fn with_template_delay(mut self, delay: Duration) -> Self {
        self.template = Arc::new(CountingTemplate::new(template_snapshot()).with_delay(delay));
        self
    }

    pub fn context(&self) -> IslandContext {
        self.context_with(self.config.clone())
    }

    pub fn context_with(&self, config: IslandConfig) -> IslandContext {
        IslandContext {
            store: self.store.clone(),
            codec: self.codec.clone(),
            template: self.template.clone(),
            resolver: self.resolver.clone(),
            events: Arc::clone(&self.events),
            clock: self.clock.clone(),
            config,
        }
    }

    pub fn config_with_version(&self, format_version: i32, delay: Duration) -> IslandConfig {
        IslandConfig {
            format_version,
            migration_notice_delay: delay,
        }
    }

    pub fn island(&self, membership: Membership) -> Arc<Island> {
        Arc::new(Island::new(membership, self.context()))
    }

    pub fn island_with(&self, membership: Membership, config: IslandConfig) -> Arc<Island> {
        Arc::new(Island::new(membership, self.context_with(config)))
    }

    /// Connect a session; the returned receiver observes the player notices.
    pub fn connect(
        &self,
        profile: ProfileId,
        island: IslandId,
    ) -> (Arc<PlayerSession>, mpsc::Receiver<PlayerNotice>) {
        let (tx, rx) = mpsc::channel(8);
        let session = self.sessions.connect(profile, island, Position::default(), tx);
        (session, rx)
    }

    /// Put a record in the store, encoding the snapshot if one is given.
    pub fn seed_record(
        &self,
        island: IslandId,
        snapshot: Option<&WorldSnapshot>,
        last_saved: Option<DateTime<Utc>>,
        version: Option<i32>,
    ) {
        let data = snapshot.map(|snapshot| self.codec.encode(snapshot).unwrap());
        self.store.insert(
            island,
            IslandRecord {
                data,
                last_saved,
                version,
            },
        );
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
