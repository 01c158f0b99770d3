//! The island registry: one entry per island identity, held forever.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use skyhold_domain::{IslandId, CURRENT_FORMAT_VERSION};

use crate::entities::island::Island;
use crate::infrastructure::event_bus::IslandEventBus;
use crate::infrastructure::ports::{
    ClockPort, IslandStore, MembershipResolver, SnapshotCodec, TemplateSource,
};

/// Island lifecycle tunables.
#[derive(Debug, Clone)]
pub struct IslandConfig {
    /// The record format version this binary writes and stamps up to.
    pub format_version: i32,
    /// How long after a migrating load the player notice is delivered.
    pub migration_notice_delay: Duration,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            migration_notice_delay: Duration::from_secs(1),
        }
    }
}

/// The collaborators every island shares, cloned into each one.
#[derive(Clone)]
pub struct IslandContext {
    pub store: Arc<dyn IslandStore>,
    pub codec: Arc<dyn SnapshotCodec>,
    pub template: Arc<dyn TemplateSource>,
    pub resolver: Arc<dyn MembershipResolver>,
    pub events: Arc<IslandEventBus>,
    pub clock: Arc<dyn ClockPort>,
    pub config: IslandConfig,
}

/// What a save-all sweep accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveAllReport {
    pub saved: usize,
    pub failed: usize,
}

/// Every island this process has referenced, keyed by island identity.
///
/// Entries are never removed. An evicted island keeps its entry - a few
/// hundred bytes of state machine - so identity, the in-flight load slot and
/// version bookkeeping survive unload/reload cycles. Only the heavyweight
/// instance inside an entry is released.
pub struct IslandRegistry {
    islands: DashMap<IslandId, Arc<Island>>,
    ctx: IslandContext,
}

impl IslandRegistry {
    pub fn new(ctx: IslandContext) -> Self {
        Self {
            islands: DashMap::new(),
            ctx,
        }
    }

    /// The island for this identity, constructing it on first reference.
    ///
    /// Membership is resolved here, once; the ownership variant is then
    /// fixed for the life of the process.
    pub async fn get_or_create(&self, id: IslandId) -> Arc<Island> {
        if let Some(island) = self.lookup(id) {
            return island;
        }

        let membership = self.ctx.resolver.resolve(id).await;
        let entry = self
            .islands
            .entry(id)
            .or_insert_with(|| Arc::new(Island::new(membership, self.ctx.clone())));
        Arc::clone(entry.value())
    }

    pub fn lookup(&self, id: IslandId) -> Option<Arc<Island>> {
        self.islands.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: IslandId) -> bool {
        self.islands.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Persist every materialized island, occupied or not. Runs to
    /// completion; failures are logged and counted, never abort the sweep.
    pub async fn force_save_all(&self) -> SaveAllReport {
        // Collect the entries first; no awaiting while holding map shards.
        let islands: Vec<Arc<Island>> = self
            .islands
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut report = SaveAllReport::default();
        for island in islands {
            match island.save_for_shutdown().await {
                Ok(true) => report.saved += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        island_id = %island.id(),
                        error = %e,
                        "Island save failed during save-all"
                    );
                }
            }
        }

        tracing::info!(
            saved = report.saved,
            failed = report.failed,
            "Force-saved all islands"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use skyhold_domain::{CoopId, Membership, ProfileId};

    use super::*;
    use crate::test_fixtures::Harness;

    #[tokio::test]
    async fn get_or_create_returns_the_same_island_every_time() {
        let harness = Harness::new();
        let registry = IslandRegistry::new(harness.context());
        let id = IslandId::from_profile(ProfileId::new());

        let a = registry.get_or_create(id).await;
        let b = registry.get_or_create(id).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert_eq!(harness.resolver.resolve_calls(), 1);
    }

    #[tokio::test]
    async fn lookup_misses_islands_never_referenced() {
        let harness = Harness::new();
        let registry = IslandRegistry::new(harness.context());

        assert!(registry.lookup(IslandId::new()).is_none());
        assert!(registry.is_empty());
        assert!(!registry.contains(IslandId::new()));
    }

    #[tokio::test]
    async fn entries_survive_eviction() {
        let harness = Harness::new();
        let registry = IslandRegistry::new(harness.context());
        let id = IslandId::from_profile(ProfileId::new());
        let island = registry.get_or_create(id).await;
        island.acquire_instance().await.unwrap();

        island.check_vacancy().await.unwrap();

        assert!(registry.contains(id));
        assert!(!registry.lookup(id).unwrap().is_materialized().await);
    }

    #[tokio::test]
    async fn coop_membership_is_resolved_at_first_reference() {
        let harness = Harness::new();
        let coop = CoopId::new();
        let members = vec![ProfileId::new(), ProfileId::new()];
        harness
            .resolver
            .seed_coop(Membership::coop(coop, members.clone()));
        let registry = IslandRegistry::new(harness.context());
        let id = IslandId::from_uuid(coop.to_uuid());

        let island = registry.get_or_create(id).await;

        assert!(island.membership().is_coop());
        assert_eq!(island.membership().member_profiles(), members.as_slice());
    }

    #[tokio::test]
    async fn force_save_all_saves_only_materialized_islands() {
        let harness = Harness::new();
        let registry = IslandRegistry::new(harness.context());

        let mut materialized = Vec::new();
        for _ in 0..3 {
            let island = registry
                .get_or_create(IslandId::from_profile(ProfileId::new()))
                .await;
            island.acquire_instance().await.unwrap();
            materialized.push(island);
        }
        let unloaded = registry
            .get_or_create(IslandId::from_profile(ProfileId::new()))
            .await;

        let report = registry.force_save_all().await;

        assert_eq!(report, SaveAllReport { saved: 3, failed: 0 });
        for island in &materialized {
            assert!(island.is_materialized().await);
            assert!(harness.store.record(island.id()).is_some());
        }
        assert!(harness.store.record(unloaded.id()).is_none());
    }
}
