//! Domain event to notification conversion.
//!
//! [`NotificationDispatcher::dispatch`] resolves the recipient's preference
//! for the event's notification type and, unless suppressed, writes one
//! `notifications` row plus one `queued` `notification_logs` row per enabled
//! channel in a single transaction. Its responsibility ends there: channel
//! senders pick up the queued logs on their own schedule.
//!
//! The notification row is keyed by the event's idempotency key, so
//! dispatching the same event twice (or concurrently) yields one row.

use std::time::Duration;

use reviewhub_core::channels::ChannelSet;
use reviewhub_core::events::DomainEvent;
use reviewhub_core::retry::RetryPolicy;
use reviewhub_core::types::DbId;
use reviewhub_db::models::notification::NewNotification;
use reviewhub_db::repositories::{
    NotificationLogRepo, NotificationPreferenceRepo, NotificationRepo,
};
use reviewhub_db::DbPool;

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// A new notification was stored with one queued log per channel.
    Queued {
        notification_id: DbId,
        channels: ChannelSet,
    },
    /// This event was already dispatched; nothing was written.
    Duplicate { notification_id: DbId },
    /// The recipient disabled this notification type or every channel.
    Suppressed,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The store aborted the unit of work; retrying may succeed.
    #[error("Transient dispatch failure: {0}")]
    Transient(String),

    /// Retrying cannot help (bad payload, unknown recipient, ...).
    #[error("Permanent dispatch failure: {0}")]
    Permanent(String),
}

impl DispatchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DispatchError::Transient(_))
    }
}

impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        if reviewhub_db::is_transient(&err) {
            DispatchError::Transient(err.to_string())
        } else {
            DispatchError::Permanent(err.to_string())
        }
    }
}

/// Writes notification intent for domain events.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: DbPool,
}

impl NotificationDispatcher {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Dispatch a single event once.
    pub async fn dispatch(&self, event: &DomainEvent) -> Result<DispatchResult, DispatchError> {
        let user_id = event.recipient();
        let notification_type = event.notification_type();
        let idempotency_key = event.idempotency_key();

        let mut tx = self.pool.begin().await?;

        if let Some(notification_id) =
            NotificationRepo::find_id_by_idempotency_key(&mut tx, &idempotency_key).await?
        {
            tracing::debug!(%idempotency_key, notification_id, "Event already dispatched");
            return Ok(DispatchResult::Duplicate { notification_id });
        }

        let preference =
            NotificationPreferenceRepo::resolve(&mut tx, user_id, notification_type).await?;
        let channels = preference
            .channel_set()
            .map_err(|e| DispatchError::Permanent(e.to_string()))?;

        if !preference.is_enabled || channels.is_empty() {
            tx.commit().await?;
            tracing::debug!(
                user_id,
                notification_type = %notification_type,
                %idempotency_key,
                "Notification suppressed by preference"
            );
            return Ok(DispatchResult::Suppressed);
        }

        let rendered = event.render();
        let input = NewNotification {
            user_id,
            notification_type,
            title: rendered.title,
            content: rendered.content,
            channels: channels.clone(),
            metadata: Some(event.metadata()),
            idempotency_key: idempotency_key.clone(),
            expires_at: event.expires_at(),
        };

        let Some(notification_id) = NotificationRepo::insert_if_absent(&mut tx, &input).await?
        else {
            // A concurrent dispatch of the same event committed first.
            let notification_id =
                NotificationRepo::find_id_by_idempotency_key(&mut tx, &idempotency_key)
                    .await?
                    .ok_or_else(|| {
                        DispatchError::Transient(format!(
                            "Notification for '{idempotency_key}' vanished after conflict"
                        ))
                    })?;
            tx.commit().await?;
            return Ok(DispatchResult::Duplicate { notification_id });
        };

        for channel in channels.iter() {
            NotificationLogRepo::insert_queued(&mut tx, notification_id, channel).await?;
        }

        tx.commit().await?;

        tracing::info!(
            user_id,
            notification_id,
            notification_type = %notification_type,
            channels = channels.len(),
            "Notification queued"
        );

        Ok(DispatchResult::Queued {
            notification_id,
            channels,
        })
    }

    /// Dispatch with a per-attempt timeout, retrying transient failures.
    ///
    /// A timed-out attempt drops its transaction, which rolls it back, and
    /// counts as transient.
    pub async fn dispatch_with_retry(
        &self,
        event: &DomainEvent,
        policy: &RetryPolicy,
        timeout: Duration,
    ) -> Result<DispatchResult, DispatchError> {
        policy
            .run(DispatchError::is_transient, |_| async move {
                match tokio::time::timeout(timeout, self.dispatch(event)).await {
                    Ok(result) => result,
                    Err(_) => Err(DispatchError::Transient(format!(
                        "Dispatch timed out after {} ms",
                        timeout.as_millis()
                    ))),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_transient() {
        assert!(DispatchError::from(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn other_store_errors_are_permanent() {
        assert!(!DispatchError::from(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn error_display() {
        let err = DispatchError::Permanent("bad payload".into());
        assert_eq!(err.to_string(), "Permanent dispatch failure: bad payload");
    }
}
