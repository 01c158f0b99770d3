//! Connected player sessions.
//!
//! Tracks every online player, their readiness gate, and where they are
//! physically standing. A session's `island_id` is the player's own island;
//! the instance they occupy may belong to someone else while visiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use skyhold_domain::{IslandId, PlayerNotice, Position, ProfileId};
use tokio::sync::{mpsc, RwLock};

use crate::entities::instance::IslandInstance;

/// One connected player's session state.
///
/// `ready_for_events` is the readiness gate: false from connect until the
/// player's island load path (or the teleport safety net) flips it true.
/// Interaction handlers consult it and silently drop actions while it is
/// false. It is a one-directional signal - the island writes it, never reads
/// it back.
pub struct PlayerSession {
    /// The player's profile identity.
    pub profile_id: ProfileId,
    /// The player's own island identity.
    pub island_id: IslandId,
    authenticated: AtomicBool,
    ready_for_events: AtomicBool,
    respawn_point: RwLock<Position>,
    current_instance: RwLock<Option<Arc<IslandInstance>>>,
    notices: mpsc::Sender<PlayerNotice>,
}

impl PlayerSession {
    fn new(
        profile_id: ProfileId,
        island_id: IslandId,
        respawn: Position,
        notices: mpsc::Sender<PlayerNotice>,
    ) -> Self {
        Self {
            profile_id,
            island_id,
            authenticated: AtomicBool::new(false),
            ready_for_events: AtomicBool::new(false),
            respawn_point: RwLock::new(respawn),
            current_instance: RwLock::new(None),
            notices,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn set_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    /// Whether gameplay interactions are allowed for this player yet.
    pub fn is_ready_for_events(&self) -> bool {
        self.ready_for_events.load(Ordering::SeqCst)
    }

    /// Flip the readiness gate. Idempotent; there is no way to unflip it
    /// short of reconnecting with a fresh session.
    pub fn set_ready_for_events(&self) {
        self.ready_for_events.store(true, Ordering::SeqCst);
    }

    pub async fn respawn_point(&self) -> Position {
        *self.respawn_point.read().await
    }

    pub async fn set_respawn_point(&self, position: Position) {
        *self.respawn_point.write().await = position;
    }

    /// The instance this player currently stands in, if any.
    pub async fn current_instance(&self) -> Option<Arc<IslandInstance>> {
        self.current_instance.read().await.clone()
    }

    /// Whether the player is placed inside some island instance.
    pub async fn is_on_island(&self) -> bool {
        self.current_instance.read().await.is_some()
    }

    /// Place this player inside an instance, leaving any previous one.
    pub async fn enter_instance(&self, instance: &Arc<IslandInstance>, position: Position) {
        let mut slot = self.current_instance.write().await;
        if let Some(previous) = slot.take() {
            previous.remove(self.profile_id).await;
        }
        instance.admit(self.profile_id, position).await;
        *slot = Some(Arc::clone(instance));
        tracing::debug!(
            profile_id = %self.profile_id,
            island_id = %instance.island_id(),
            "Player entered island instance"
        );
    }

    /// Remove this player from whatever instance they occupy.
    pub async fn leave_current_instance(&self) {
        let mut slot = self.current_instance.write().await;
        if let Some(instance) = slot.take() {
            instance.remove(self.profile_id).await;
        }
    }

    /// Best-effort push down the session's notice channel. A full or closed
    /// channel drops the notice.
    pub fn send_notice(&self, notice: PlayerNotice) {
        if let Err(e) = self.notices.try_send(notice) {
            tracing::warn!(
                profile_id = %self.profile_id,
                error = %e,
                "Failed to deliver player notice"
            );
        }
    }
}

/// Directory of every connected player, keyed by profile identity.
pub struct SessionDirectory {
    sessions: DashMap<ProfileId, Arc<PlayerSession>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a freshly connected player. The readiness gate starts false.
    pub fn connect(
        &self,
        profile: ProfileId,
        island_id: IslandId,
        respawn: Position,
        notices: mpsc::Sender<PlayerNotice>,
    ) -> Arc<PlayerSession> {
        let session = Arc::new(PlayerSession::new(profile, island_id, respawn, notices));
        self.sessions.insert(profile, Arc::clone(&session));
        tracing::debug!(profile_id = %profile, island_id = %island_id, "Session connected");
        session
    }

    /// Drop a player's session, removing them from any instance they occupy.
    pub async fn disconnect(&self, profile: ProfileId) {
        if let Some((_, session)) = self.sessions.remove(&profile) {
            session.leave_current_instance().await;
            tracing::debug!(profile_id = %profile, "Session disconnected");
        }
    }

    pub fn get(&self, profile: ProfileId) -> Option<Arc<PlayerSession>> {
        self.sessions.get(&profile).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of every online session.
    pub fn online(&self) -> Vec<Arc<PlayerSession>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}
