// src/notifier/broadcast.rs

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::notifier::{NotificationEvent, Notifier};

/// [`Notifier`] that logs every message and fans events out to all
/// subscribers (one per connected live-reload client).
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<NotificationEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, event: NotificationEvent) {
        // No subscribers is the normal case before a browser connects.
        if let Err(err) = self.tx.send(event) {
            debug!(event = ?err.0, "no live-reload clients connected; event dropped");
        }
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, message: &str) {
        info!(target: "sitepipe::notify", "{message}");
        self.publish(NotificationEvent::Message(message.to_string()));
    }

    fn reload(&self) {
        info!(target: "sitepipe::notify", clients = self.client_count(), "reloading browsers");
        self.publish(NotificationEvent::Reload);
    }
}
