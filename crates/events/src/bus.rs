//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//!
//! The bus is a fast path only. Every event published here has already been
//! committed to the `domain_events` outbox, so a dropped or lagged message is
//! recovered later by the [`OutboxRelay`](crate::outbox::OutboxRelay).

use chrono::{DateTime, Utc};
use reviewhub_core::events::DomainEvent;
use reviewhub_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A committed domain event travelling over the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Id of the `domain_events` row this event was recorded as, if any.
    pub outbox_id: Option<DbId>,

    pub event: DomainEvent,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            outbox_id: None,
            event,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Link the event to its outbox row so consumers can mark it dispatched.
    pub fn with_outbox_id(mut self, outbox_id: DbId) -> Self {
        self.outbox_id = Some(outbox_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Messages a subscriber may fall behind by before it starts seeing `Lagged`.
const BUS_CAPACITY: usize = 1024;

/// Fan-out of committed events to in-process consumers, shared as
/// `Arc<EventBus>`.
///
/// Slow receivers lose the oldest messages (`RecvError::Lagged`); the outbox
/// relay picks those up.
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: broadcast::Sender::new(capacity),
        }
    }

    /// Hand `event` to every live subscriber, returning how many there were.
    pub fn publish(&self, event: PlatformEvent) -> usize {
        let kind = event.event.kind();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!(kind, "No bus subscribers, event left to the outbox relay");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(BUS_CAPACITY)
    }
}
