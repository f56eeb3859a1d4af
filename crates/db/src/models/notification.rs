//! Notification, delivery log, and preference models and DTOs.

use reviewhub_core::channels::ChannelSet;
use reviewhub_core::error::CoreError;
use reviewhub_core::notification_type::NotificationType;
use reviewhub_core::status::StatusId;
use reviewhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: String,
    pub title: String,
    pub content: String,
    pub channels: serde_json::Value,
    pub metadata: Option<serde_json::Value>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub idempotency_key: String,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert payload for a dispatched notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub notification_type: NotificationType,
    pub title: String,
    pub content: String,
    pub channels: ChannelSet,
    pub metadata: Option<serde_json::Value>,
    pub idempotency_key: String,
    pub expires_at: Option<Timestamp>,
}

/// A row from the `notification_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationLog {
    pub id: DbId,
    pub notification_id: DbId,
    pub channel: String,
    pub status_id: StatusId,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub next_attempt_at: Timestamp,
    pub created_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
}

/// A queued delivery leased by a channel worker, joined with what the sender needs.
#[derive(Debug, Clone, FromRow)]
pub struct ClaimedDelivery {
    pub log_id: DbId,
    pub notification_id: DbId,
    pub channel: String,
    /// Attempt number of this lease (1 on first try).
    pub attempts: i32,
    pub user_id: DbId,
    pub email: String,
    pub title: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: String,
    pub is_enabled: bool,
    pub channels: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    pub fn channel_set(&self) -> Result<ChannelSet, CoreError> {
        ChannelSet::from_json(&self.channels)
    }
}

/// One entry of a `PUT /notifications/preferences` body.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceUpdate {
    pub notification_type: NotificationType,
    pub channels: ChannelSet,
    pub is_enabled: bool,
}
