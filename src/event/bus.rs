use tokio::sync::broadcast;
use tracing::debug;

use super::events::LeagueEvent;

/// Fan-out of committed-write notifications to live readers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LeagueEvent>,
}

impl EventBus {
    /// Creates a bus whose subscribers may lag by at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emits an event to every current subscriber
    pub fn emit(&self, event: LeagueEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(event_type, receivers = receiver_count, "League event emitted");
            }
            Err(_) => {
                debug!(event_type, "League event emitted with no receivers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeagueEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
