// src/notifier/mod.rs

//! Progress messages and browser reload signals.
//!
//! Notifications are best effort: neither method can fail the caller. The
//! reload ordering contract is upheld by the task graph itself, where the
//! `reload` leaf is always the last step of a `series`.

pub mod broadcast;

use std::fmt;

pub use broadcast::BroadcastNotifier;

/// A transient event pushed to connected browser clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Message(String),
    Reload,
}

impl NotificationEvent {
    /// Text frame sent over the live-reload socket.
    pub fn to_wire(&self) -> String {
        match self {
            NotificationEvent::Message(text) => format!("message:{text}"),
            NotificationEvent::Reload => "reload".to_string(),
        }
    }
}

/// Sink for progress messages and reload requests.
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Emit a human-readable progress message.
    fn notify(&self, message: &str);

    /// Ask connected clients to refresh.
    fn reload(&self);
}
