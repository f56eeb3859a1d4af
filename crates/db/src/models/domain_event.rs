//! Outbox rows for domain events awaiting notification dispatch.

use reviewhub_core::events::DomainEvent;
use reviewhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `domain_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredEvent {
    pub id: DbId,
    pub event_kind: String,
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub actor_user_id: Option<DbId>,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub dispatched_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl StoredEvent {
    /// Decode the stored payload back into its typed event.
    pub fn event(&self) -> Result<DomainEvent, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
