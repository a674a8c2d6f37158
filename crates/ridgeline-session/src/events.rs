//! Process-wide reader event bus.
//!
//! Identification and registry mutations are announced on a broadcast
//! channel so that any number of consumers (the WebSocket transport, tests,
//! future integrations) can observe them without the core knowing who is
//! listening. Delivery is fire-and-forget: there is no backpressure or
//! acknowledgement, and a subscriber that falls behind loses the oldest
//! events rather than slowing the reader down.

use ridgeline_core::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Maximum events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Notification emitted by the reader core.
///
/// The serde representation is the wire format pushed to WebSocket clients:
/// a `"event"` tag with kebab-case names and camelCase payload fields.
/// Events never carry fingerprint templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ReaderEvent {
    /// A finger on the sensor matched an enrolled user.
    #[serde(rename_all = "camelCase")]
    Identify { user_id: UserId, user_data: Value },

    /// An enrollment completed and the user was persisted.
    #[serde(rename_all = "camelCase")]
    UserAdd { user_id: UserId, user_data: Value },

    /// A user's metadata was replaced.
    #[serde(rename_all = "camelCase")]
    UserUpdate { user_id: UserId, user_data: Value },

    /// A user was removed from the registry.
    #[serde(rename_all = "camelCase")]
    UserDelete { user_id: UserId },
}

impl ReaderEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ReaderEvent::Identify { .. } => "identify",
            ReaderEvent::UserAdd { .. } => "user-add",
            ReaderEvent::UserUpdate { .. } => "user-update",
            ReaderEvent::UserDelete { .. } => "user-delete",
        }
    }
}

/// Broadcast bus for [`ReaderEvent`]s.
///
/// Cloning the bus is cheap and every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ReaderEvent>,
}

impl EventBus {
    /// Create a bus with the default per-subscriber capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a bus with a specific per-subscriber capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers the event was delivered to; zero
    /// subscribers is not an error.
    pub fn publish(&self, event: ReaderEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
