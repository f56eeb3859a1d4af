//! Periodic sweep over undispatched outbox rows.
//!
//! The bus is best effort: a subscriber can lag, the process can restart
//! between commit and publish, or the router can give up on a transient
//! failure. [`OutboxRelay`] closes those gaps by claiming `domain_events`
//! rows that are still pending after a grace period and dispatching them
//! again. The notification idempotency key makes a second dispatch of an
//! already handled event a no-op.

use std::sync::Arc;
use std::time::Duration;

use reviewhub_db::models::domain_event::StoredEvent;
use reviewhub_db::repositories::DomainEventRepo;
use reviewhub_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::alert::{AlertSink, DispatchAlert};
use crate::dispatcher::NotificationDispatcher;

/// Events claimed per sweep.
const DEFAULT_BATCH_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct OutboxRelayConfig {
    pub poll_interval: Duration,
    /// Minimum age of a pending row before the relay touches it.
    pub grace: Duration,
    /// Failed dispatches after which a row is left for an operator.
    pub max_attempts: u32,
    pub batch_size: i64,
    /// Per-dispatch timeout; the claim lease is derived from it.
    pub dispatch_timeout: Duration,
}

impl Default for OutboxRelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            grace: Duration::from_secs(30),
            max_attempts: 5,
            batch_size: DEFAULT_BATCH_SIZE,
            dispatch_timeout: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// OutboxRelay
// ---------------------------------------------------------------------------

pub struct OutboxRelay {
    pool: DbPool,
    dispatcher: NotificationDispatcher,
    config: OutboxRelayConfig,
    alerts: Arc<dyn AlertSink>,
}

impl OutboxRelay {
    pub fn new(pool: DbPool, config: OutboxRelayConfig, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            dispatcher: NotificationDispatcher::new(pool.clone()),
            pool,
            config,
            alerts,
        }
    }

    /// Run the relay loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        tracing::info!(
            poll_secs = self.config.poll_interval.as_secs(),
            grace_secs = self.config.grace.as_secs(),
            "Outbox relay started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox relay cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.relay_once().await {
                        Ok(0) => {}
                        Ok(count) => tracing::info!(count, "Relayed pending outbox events"),
                        Err(e) => tracing::error!(error = %e, "Failed to sweep outbox"),
                    }
                }
            }
        }
    }

    /// Claim one batch of pending events and dispatch each of them.
    ///
    /// Returns the number of events dispatched successfully.
    pub async fn relay_once(&self) -> Result<usize, sqlx::Error> {
        let lease = self.config.dispatch_timeout * 2;
        let claimed = DomainEventRepo::claim_pending(
            &self.pool,
            self.config.grace,
            self.config.max_attempts as i32,
            self.config.batch_size,
            lease,
        )
        .await?;

        let mut dispatched = 0;
        for stored in &claimed {
            if self.relay_event(stored).await? {
                dispatched += 1;
            }
        }
        Ok(dispatched)
    }

    async fn relay_event(&self, stored: &StoredEvent) -> Result<bool, sqlx::Error> {
        let outcome = match stored.event() {
            Ok(event) => {
                match tokio::time::timeout(
                    self.config.dispatch_timeout,
                    self.dispatcher.dispatch(&event),
                )
                .await
                {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(e)) => Err((e.is_transient(), e.to_string())),
                    Err(_) => Err((true, "Dispatch timed out".to_string())),
                }
            }
            Err(e) => Err((false, format!("Undecodable event payload: {e}"))),
        };

        match outcome {
            Ok(result) => {
                DomainEventRepo::mark_dispatched(&self.pool, stored.id).await?;
                tracing::debug!(outbox_id = stored.id, outcome = ?result, "Outbox event relayed");
                Ok(true)
            }
            Err((transient, error)) => {
                let max_attempts = self.config.max_attempts as i32;
                let attempts = if transient {
                    DomainEventRepo::record_failure(&self.pool, stored.id, &error).await?
                } else {
                    DomainEventRepo::give_up(&self.pool, stored.id, &error, max_attempts).await?
                };
                if attempts >= max_attempts {
                    self.alerts
                        .raise(DispatchAlert {
                            outbox_id: Some(stored.id),
                            event_kind: stored.event_kind.clone(),
                            idempotency_key: stored.idempotency_key.clone(),
                            attempts: attempts.max(0) as u32,
                            error,
                        })
                        .await;
                } else {
                    tracing::warn!(
                        outbox_id = stored.id,
                        attempts,
                        error = %error,
                        "Outbox dispatch failed, will retry"
                    );
                }
                Ok(false)
            }
        }
    }
}
