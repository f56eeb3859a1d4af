//! Bus consumer that turns published events into notifications.
//!
//! [`NotificationRouter`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and dispatches every event it receives. Each dispatch runs with a timeout
//! and transient failures are retried with backoff. On success the event's
//! outbox row is marked dispatched; on failure the row keeps its pending
//! state for the [`OutboxRelay`](crate::outbox::OutboxRelay) and the failure
//! is raised through the configured [`AlertSink`].

use std::sync::Arc;
use std::time::Duration;

use reviewhub_core::retry::RetryPolicy;
use reviewhub_db::repositories::DomainEventRepo;
use reviewhub_db::DbPool;
use tokio::sync::broadcast;

use crate::alert::{AlertSink, DispatchAlert};
use crate::bus::PlatformEvent;
use crate::dispatcher::{DispatchResult, NotificationDispatcher};

/// Routes bus events to the notification dispatcher.
pub struct NotificationRouter {
    pool: DbPool,
    dispatcher: NotificationDispatcher,
    policy: RetryPolicy,
    timeout: Duration,
    /// Attempt count at which the outbox relay stops claiming a row.
    max_outbox_attempts: i32,
    alerts: Arc<dyn AlertSink>,
}

impl NotificationRouter {
    pub fn new(
        pool: DbPool,
        policy: RetryPolicy,
        timeout: Duration,
        max_outbox_attempts: u32,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            dispatcher: NotificationDispatcher::new(pool.clone()),
            pool,
            policy,
            timeout,
            max_outbox_attempts: i32::try_from(max_outbox_attempts).unwrap_or(i32::MAX),
            alerts,
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped). Lagged messages are
    /// not lost: their outbox rows stay pending for the relay.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.handle(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification router lagged, outbox relay will pick up skipped events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Dispatch one event and settle its outbox row.
    pub async fn handle(&self, event: &PlatformEvent) -> Option<DispatchResult> {
        let kind = event.event.kind();
        let result = self
            .dispatcher
            .dispatch_with_retry(&event.event, &self.policy, self.timeout)
            .await;

        match result {
            Ok(outcome) => {
                if let Some(outbox_id) = event.outbox_id {
                    if let Err(e) = DomainEventRepo::mark_dispatched(&self.pool, outbox_id).await {
                        // The relay redispatches it as a Duplicate.
                        tracing::warn!(outbox_id, error = %e, "Failed to mark event dispatched");
                    }
                }
                tracing::debug!(event_kind = kind, outcome = ?outcome, "Event routed");
                Some(outcome)
            }
            Err(e) => {
                let error = e.to_string();
                let attempts = if e.is_transient() {
                    self.policy.max_attempts
                } else {
                    1
                };
                if let Some(outbox_id) = event.outbox_id {
                    let recorded = if e.is_transient() {
                        DomainEventRepo::record_failure(&self.pool, outbox_id, &error).await
                    } else {
                        DomainEventRepo::give_up(
                            &self.pool,
                            outbox_id,
                            &error,
                            self.max_outbox_attempts,
                        )
                        .await
                    };
                    if let Err(db_err) = recorded {
                        tracing::error!(outbox_id, error = %db_err, "Failed to record outbox failure");
                    }
                }
                self.alerts
                    .raise(DispatchAlert {
                        outbox_id: event.outbox_id,
                        event_kind: kind.to_string(),
                        idempotency_key: event.event.idempotency_key(),
                        attempts,
                        error,
                    })
                    .await;
                None
            }
        }
    }
}
