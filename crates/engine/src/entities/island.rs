//! The island aggregate: one group's world and its lifecycle state machine.
//!
//! An island moves through `Unloaded -> Loading -> Materialized` and back to
//! `Unloaded` when a vacancy check evicts it. The whole lifecycle lives
//! behind one async mutex; the load itself runs on a spawned task shared by
//! every concurrent caller through a [`Shared`] future, so a second acquire
//! during a load never starts a second load.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use skyhold_domain::{IslandEvent, IslandId, Membership, PlayerNotice, WorldSnapshot};
use tokio::sync::Mutex;

use crate::entities::instance::IslandInstance;
use crate::entities::registry::IslandContext;
use crate::infrastructure::ports::{IslandRecord, SnapshotError, StoreError};

/// Why a load attempt failed. Cloneable so every waiter on the shared load
/// future receives the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("Island load failed: {0}")]
    Store(#[from] StoreError),

    #[error("Island load failed: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The spawned load task panicked or was aborted. The island stays
    /// faulted; recovery is an operator concern.
    #[error("Island load task aborted before completion")]
    TaskFailed,
}

/// Why a save failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistError {
    #[error("Island save failed: {0}")]
    Store(#[from] StoreError),

    #[error("Island save failed: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// What a vacancy check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyOutcome {
    /// Nothing to do: the island holds no runtime instance.
    NotMaterialized,
    /// Someone is standing in the instance; left untouched.
    Occupied,
    /// Saved and unloaded.
    Evicted,
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<IslandInstance>, LoadError>>>;

enum LoadPhase {
    Unloaded,
    /// A load is in flight; clones of this future all await the same task.
    Loading(SharedLoad),
    Materialized(Arc<IslandInstance>),
}

struct IslandState {
    phase: LoadPhase,
    format_version: i32,
    last_saved: Option<DateTime<Utc>>,
}

/// What a load produced, before it is attached to a runtime instance.
struct LoadedSnapshot {
    snapshot: WorldSnapshot,
    format_version: i32,
    last_saved: Option<DateTime<Utc>>,
}

/// One group's island. Constructed once per island identity by the registry
/// and never removed; only the runtime instance inside comes and goes.
pub struct Island {
    id: IslandId,
    membership: Membership,
    /// Shared with in-flight load tasks, which materialize into it.
    state: Arc<Mutex<IslandState>>,
    ctx: IslandContext,
}

impl Island {
    pub fn new(membership: Membership, ctx: IslandContext) -> Self {
        Self {
            id: membership.island_id(),
            state: Arc::new(Mutex::new(IslandState {
                phase: LoadPhase::Unloaded,
                format_version: ctx.config.format_version,
                last_saved: None,
            })),
            membership,
            ctx,
        }
    }

    pub fn id(&self) -> IslandId {
        self.id
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub async fn is_materialized(&self) -> bool {
        matches!(self.state.lock().await.phase, LoadPhase::Materialized(_))
    }

    /// The live instance when materialized. Never triggers a load.
    pub async fn instance(&self) -> Option<Arc<IslandInstance>> {
        match &self.state.lock().await.phase {
            LoadPhase::Materialized(instance) => Some(Arc::clone(instance)),
            _ => None,
        }
    }

    /// The record format version this island currently carries in memory.
    pub async fn format_version(&self) -> i32 {
        self.state.lock().await.format_version
    }

    pub async fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_saved
    }

    /// Get the live instance, loading it first if needed.
    ///
    /// Exactly one load runs per island however many callers arrive: the
    /// first caller on an unloaded island spawns the load task and installs
    /// the shared handle; everyone else awaits a clone of it and receives the
    /// same instance or the same error. By the time any caller's future
    /// resolves, the readiness gate of every online member has been flipped.
    ///
    /// A failed attempt resets the island to unloaded, so a later call
    /// retries from scratch. The load task is never cancelled; it runs to
    /// completion even if every waiter goes away.
    pub async fn acquire_instance(&self) -> Result<Arc<IslandInstance>, LoadError> {
        let mut state = self.state.lock().await;

        if let LoadPhase::Materialized(instance) = &state.phase {
            let instance = Arc::clone(instance);
            drop(state);
            // Members who connected after materialization still need their
            // readiness gate flipped.
            self.mark_online_members_ready();
            return Ok(instance);
        }

        if let LoadPhase::Loading(load) = &state.phase {
            let load = load.clone();
            drop(state);
            return load.await;
        }

        let load = self.spawn_load();
        state.phase = LoadPhase::Loading(load.clone());
        drop(state);
        load.await
    }

    /// Spawn the single-flight load task. The shared handle resolves when
    /// the task returns; a panicked task surfaces as [`LoadError::TaskFailed`]
    /// and leaves the slot faulted.
    fn spawn_load(&self) -> SharedLoad {
        let task = LoadTask {
            id: self.id,
            membership: self.membership.clone(),
            state: Arc::clone(&self.state),
            ctx: self.ctx.clone(),
        };
        let handle = tokio::spawn(task.run());
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Island load task failed");
                    Err(LoadError::TaskFailed)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Flip the readiness gate of every currently online member.
    fn mark_online_members_ready(&self) {
        for session in self.ctx.resolver.online_members(&self.membership) {
            session.set_ready_for_events();
        }
    }

    /// Save and unload the island if nobody is inside it.
    ///
    /// The state lock is held across the save, so a concurrent acquire
    /// either runs before the check or waits and then reloads; it never
    /// observes a half-evicted island. A save failure leaves the island
    /// materialized for the next sweep to retry.
    pub async fn check_vacancy(&self) -> Result<VacancyOutcome, PersistError> {
        let mut state = self.state.lock().await;

        let instance = if let LoadPhase::Materialized(instance) = &state.phase {
            Arc::clone(instance)
        } else {
            return Ok(VacancyOutcome::NotMaterialized);
        };

        if instance.occupant_count().await > 0 {
            return Ok(VacancyOutcome::Occupied);
        }

        self.ctx.events.publish(IslandEvent::SavedIntoDatabase {
            island_id: self.id,
            coop: self.membership.is_coop(),
            members: self.membership.member_profiles().to_vec(),
        });

        Self::persist_instance(&self.ctx, self.id, &mut state, &instance).await?;

        state.phase = LoadPhase::Unloaded;
        instance.unload_all().await;

        tracing::info!(island_id = %self.id, "Island evicted after vacancy check");
        Ok(VacancyOutcome::Evicted)
    }

    /// Persist without evicting, whatever the occupancy. Returns whether
    /// there was a materialized instance to save.
    pub async fn save_for_shutdown(&self) -> Result<bool, PersistError> {
        let mut state = self.state.lock().await;

        let instance = if let LoadPhase::Materialized(instance) = &state.phase {
            Arc::clone(instance)
        } else {
            return Ok(false);
        };

        Self::persist_instance(&self.ctx, self.id, &mut state, &instance).await?;
        Ok(true)
    }

    /// Flush live edits into the snapshot, encode it, and write the three
    /// record fields back: blob, save timestamp, format version. Each field
    /// is its own idempotent upsert.
    async fn persist_instance(
        ctx: &IslandContext,
        id: IslandId,
        state: &mut IslandState,
        instance: &IslandInstance,
    ) -> Result<(), PersistError> {
        let flushed = instance.flush_edits().await;
        let bytes = instance.encode_with(ctx.codec.as_ref()).await?;

        ctx.store.put_snapshot(id, &bytes).await?;
        let now = ctx.clock.now();
        ctx.store.put_last_saved(id, now).await?;
        ctx.store.put_version(id, state.format_version).await?;

        state.last_saved = Some(now);
        tracing::debug!(
            island_id = %id,
            bytes = bytes.len(),
            edits = flushed,
            version = state.format_version,
            "Island saved"
        );
        Ok(())
    }
}

/// Everything a load needs once it leaves the acquiring caller. The task
/// owns its own handles and writes the outcome back through the shared
/// state, so it keeps running even if every waiter is dropped.
struct LoadTask {
    id: IslandId,
    membership: Membership,
    state: Arc<Mutex<IslandState>>,
    ctx: IslandContext,
}

impl LoadTask {
    async fn run(self) -> Result<Arc<IslandInstance>, LoadError> {
        let result = self.load_and_materialize().await;
        if let Err(e) = &result {
            tracing::warn!(island_id = %self.id, error = %e, "Island load failed");
            // Reset before the shared future resolves so waiters that retry
            // immediately find the island unloaded.
            self.state.lock().await.phase = LoadPhase::Unloaded;
        }
        result
    }

    /// The load path proper. Runs inside the spawned task, so gate flips and
    /// event publishes all happen before any waiter's future resolves.
    async fn load_and_materialize(&self) -> Result<Arc<IslandInstance>, LoadError> {
        // Resolved up front: these are the sessions whose gates this load is
        // responsible for.
        let online = self.ctx.resolver.online_members(&self.membership);

        let record = self.ctx.store.fetch(self.id).await?;
        let loaded = match record {
            Some(record) => self.restore(record).await?,
            None => self.first_creation().await?,
        };

        let instance = Arc::new(IslandInstance::new(self.id, loaded.snapshot));

        {
            let mut state = self.state.lock().await;
            state.format_version = loaded.format_version;
            state.last_saved = loaded.last_saved;
            state.phase = LoadPhase::Materialized(Arc::clone(&instance));
        }

        let chunks = instance.resident_chunk_count().await;
        tracing::info!(
            island_id = %self.id,
            kind = self.membership.kind(),
            chunks,
            online = online.len(),
            "Island materialized"
        );

        self.ctx.events.publish(IslandEvent::FetchedFromDatabase {
            island_id: self.id,
            coop: self.membership.is_coop(),
            online: online.iter().map(|session| session.profile_id).collect(),
            members: self.membership.member_profiles().to_vec(),
        });

        for session in &online {
            session.set_ready_for_events();
        }

        Ok(instance)
    }

    /// Build the runtime snapshot from a stored record, stamping the format
    /// version forward when the record predates the current one.
    async fn restore(&self, record: IslandRecord) -> Result<LoadedSnapshot, LoadError> {
        // Records from before versioning began carry no version at all.
        let stored_version = record.version.unwrap_or(0);
        let current = self.ctx.config.format_version;

        let (snapshot, last_saved) = match record.data {
            Some(bytes) => {
                let snapshot = self.ctx.codec.decode(&bytes)?;
                let last_saved = record.last_saved.unwrap_or_else(|| self.ctx.clock.now());
                (snapshot, last_saved)
            }
            None => {
                // Legacy record with metadata but no world blob. Start over
                // from the template rather than failing the load.
                tracing::warn!(
                    island_id = %self.id,
                    "Island record has no world data, falling back to template"
                );
                (self.ctx.template.materialize().await?, self.ctx.clock.now())
            }
        };

        let format_version = if stored_version < current {
            self.schedule_migration_notice(stored_version, current);
            current
        } else {
            // Already current, or written by a newer binary. Versions never
            // move backward.
            stored_version
        };

        Ok(LoadedSnapshot {
            snapshot,
            format_version,
            last_saved: Some(last_saved),
        })
    }

    /// Materialize a brand-new island from the template. `last_saved` stays
    /// unset until the first persist.
    async fn first_creation(&self) -> Result<LoadedSnapshot, LoadError> {
        let snapshot = self.ctx.template.materialize().await?;

        tracing::info!(
            island_id = %self.id,
            kind = self.membership.kind(),
            "Creating island from template"
        );

        self.ctx.events.publish(IslandEvent::FirstCreated {
            island_id: self.id,
            coop: self.membership.is_coop(),
            members: self.membership.member_profiles().to_vec(),
        });

        Ok(LoadedSnapshot {
            snapshot,
            format_version: self.ctx.config.format_version,
            last_saved: None,
        })
    }

    /// Tell online members their island record was migrated, after a short
    /// delay so the client has finished joining when the message lands. The
    /// online set is re-resolved at fire time, so members who join during
    /// the wait are told too.
    fn schedule_migration_notice(&self, from: i32, to: i32) {
        tracing::info!(
            island_id = %self.id,
            from,
            to,
            "Island record format version migrated"
        );
        let membership = self.membership.clone();
        let resolver = Arc::clone(&self.ctx.resolver);
        let delay = self.ctx.config.migration_notice_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for session in resolver.online_members(&membership) {
                session.send_notice(PlayerNotice::IslandMigrated { from, to });
            }
        });
    }
}
