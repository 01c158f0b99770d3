//! Item interaction routing, behind the readiness gate.
//!
//! Every interaction from a session whose island data has not finished
//! loading is silently dropped. That is the gate's whole contract: item
//! behaviors never observe a player whose world is not there yet.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use skyhold_domain::BlockPos;

use crate::sessions::PlayerSession;

/// A right-clickable item behavior. What the behavior does is out of scope
/// here; the router only guarantees it is never invoked early.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Interactable: Send + Sync {
    /// The item was used in the air.
    async fn on_right_click(&self, session: &Arc<PlayerSession>, kind: &str);

    /// The item was used against a block.
    async fn on_right_click_block(
        &self,
        session: &Arc<PlayerSession>,
        kind: &str,
        pos: BlockPos,
    );
}

/// What a routed interaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Dropped before reaching a handler: the session is not ready yet.
    Ignored,
    /// No behavior registered for this item kind.
    NoHandler,
    /// Delivered to the registered handler.
    Dispatched,
}

/// Routes item uses to registered behaviors, keyed by item kind.
/// Handlers are registered at composition time.
pub struct InteractionRouter {
    handlers: HashMap<String, Arc<dyn Interactable>>,
}

impl InteractionRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn Interactable>) {
        self.handlers.insert(kind.into(), handler);
    }

    pub async fn use_item(&self, session: &Arc<PlayerSession>, kind: &str) -> InteractionOutcome {
        if !session.is_ready_for_events() {
            Self::log_ignored(session, kind);
            return InteractionOutcome::Ignored;
        }
        match self.handlers.get(kind) {
            Some(handler) => {
                handler.on_right_click(session, kind).await;
                InteractionOutcome::Dispatched
            }
            None => InteractionOutcome::NoHandler,
        }
    }

    pub async fn use_item_on_block(
        &self,
        session: &Arc<PlayerSession>,
        kind: &str,
        pos: BlockPos,
    ) -> InteractionOutcome {
        if !session.is_ready_for_events() {
            Self::log_ignored(session, kind);
            return InteractionOutcome::Ignored;
        }
        match self.handlers.get(kind) {
            Some(handler) => {
                handler.on_right_click_block(session, kind, pos).await;
                InteractionOutcome::Dispatched
            }
            None => InteractionOutcome::NoHandler,
        }
    }

    fn log_ignored(session: &PlayerSession, kind: &str) {
        // Routine while the island is still loading; not an error.
        tracing::trace!(
            profile_id = %session.profile_id,
            kind,
            "Interaction ignored, session not ready"
        );
    }
}

impl Default for InteractionRouter {
    fn default() -> Self {
        Self::new()
    }
}
