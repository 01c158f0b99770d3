//! Island event fan-out.
//!
//! Lifecycle events are published fire-and-forget over a broadcast channel.
//! Publishing never blocks the island state machine: with no subscriber the
//! event is dropped, and a lagging subscriber loses the oldest events.

use skyhold_domain::IslandEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const EVENT_BUS_CAPACITY: usize = 64;

pub struct IslandEventBus {
    sender: broadcast::Sender<IslandEvent>,
}

impl IslandEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped if nobody listens.
    pub fn publish(&self, event: IslandEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IslandEvent> {
        self.sender.subscribe()
    }

    /// Spawn the in-process consumer that logs every island event.
    pub fn spawn_event_logger(&self) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        tracing::info!(
                            island_id = %event.island_id(),
                            event_type = event.event_type(),
                            "Island event"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event logger lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for IslandEventBus {
    fn default() -> Self {
        Self::new()
    }
}
