use tokio::sync::broadcast;

use crate::domain::models::SessionEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of session events to connected views.
///
/// Subscribers that fall behind lose events and should re-read the active
/// session; the store stays the source of truth.
#[derive(Debug, Clone)]
pub struct SessionNotifier {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionNotifier {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: SessionEvent) {
        // No receivers is the normal idle state.
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::trace!(receivers, "published session event");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new()
    }
}
