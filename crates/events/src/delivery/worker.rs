//! Background worker that drains queued delivery logs.
//!
//! Each tick the worker leases a batch of `queued` rows for the channels it
//! has senders for (`FOR UPDATE SKIP LOCKED`, so several workers can run
//! side by side), delivers them concurrently, and settles every row as
//! `sent`, rescheduled with backoff, or `failed` once attempts run out.
//! Channels without a registered sender are never claimed and stay queued
//! for an external consumer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reviewhub_core::channels::Channel;
use reviewhub_core::retry::RetryPolicy;
use reviewhub_db::models::notification::ClaimedDelivery;
use reviewhub_db::repositories::NotificationLogRepo;
use reviewhub_db::DbPool;
use tokio_util::sync::CancellationToken;

use super::ChannelSender;

/// Deliveries in flight at once within a batch.
const MAX_CONCURRENT_SENDS: usize = 16;

#[derive(Debug, Clone)]
pub struct DeliveryWorkerConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    /// How long a claimed row stays hidden from other workers.
    pub lease: Duration,
    /// Attempt budget and backoff between attempts, per log row.
    pub retry: RetryPolicy,
}

impl Default for DeliveryWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 50,
            lease: Duration::from_secs(60),
            retry: RetryPolicy::new(5, Duration::from_secs(30), Duration::from_secs(3600)),
        }
    }
}

/// Tally of one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

pub struct DeliveryWorker {
    pool: DbPool,
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
    config: DeliveryWorkerConfig,
}

impl DeliveryWorker {
    pub fn new(pool: DbPool, config: DeliveryWorkerConfig) -> Self {
        Self {
            pool,
            senders: HashMap::new(),
            config,
        }
    }

    /// Register the sender for its channel, replacing any previous one.
    pub fn with_sender(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(sender.channel(), sender);
        self
    }

    /// Channels this worker claims, in a stable order.
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.senders.keys().copied().collect();
        channels.sort();
        channels
    }

    /// Run the worker loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let channels = self.channels();
        if channels.is_empty() {
            tracing::warn!("Delivery worker has no channel senders, not starting");
            return;
        }
        tracing::info!(channels = ?channels, "Delivery worker started");

        let mut interval = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Delivery worker cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.process_batch().await {
                        Ok(report) if report == BatchReport::default() => {}
                        Ok(report) => tracing::info!(
                            sent = report.sent,
                            retried = report.retried,
                            failed = report.failed,
                            "Processed delivery batch"
                        ),
                        Err(e) => tracing::error!(error = %e, "Failed to claim deliveries"),
                    }
                }
            }
        }
    }

    /// Claim and deliver one batch.
    pub async fn process_batch(&self) -> Result<BatchReport, sqlx::Error> {
        let claimed = NotificationLogRepo::claim_queued(
            &self.pool,
            &self.channels(),
            self.config.batch_size,
            self.config.lease,
        )
        .await?;

        let outcomes: Vec<Outcome> = futures::stream::iter(claimed)
            .map(|delivery| async move { self.deliver(&delivery).await })
            .buffer_unordered(MAX_CONCURRENT_SENDS)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Sent => report.sent += 1,
                Outcome::Retried => report.retried += 1,
                Outcome::Failed => report.failed += 1,
            }
        }
        Ok(report)
    }

    async fn deliver(&self, delivery: &ClaimedDelivery) -> Outcome {
        let result = match delivery.channel.parse::<Channel>() {
            Ok(channel) => match self.senders.get(&channel) {
                Some(sender) => sender
                    .send(delivery)
                    .await
                    .map_err(|e| (e.is_retryable(), e.to_string())),
                None => Err((false, format!("No sender for channel '{channel}'"))),
            },
            Err(e) => Err((false, e.to_string())),
        };

        let attempts = u32::try_from(delivery.attempts).unwrap_or(u32::MAX);
        let (outcome, settled) = match result {
            Ok(()) => (
                Outcome::Sent,
                NotificationLogRepo::mark_sent(&self.pool, delivery.log_id).await,
            ),
            Err((retryable, error)) if retryable && attempts < self.config.retry.max_attempts => {
                let delay = self.config.retry.delay_for(attempts);
                tracing::warn!(
                    log_id = delivery.log_id,
                    channel = %delivery.channel,
                    attempts,
                    retry_in_secs = delay.as_secs(),
                    error = %error,
                    "Delivery failed, rescheduled"
                );
                (
                    Outcome::Retried,
                    NotificationLogRepo::record_failure(
                        &self.pool,
                        delivery.log_id,
                        &error,
                        Some(delay),
                    )
                    .await,
                )
            }
            Err((_, error)) => {
                tracing::error!(
                    log_id = delivery.log_id,
                    channel = %delivery.channel,
                    attempts,
                    error = %error,
                    "Delivery failed permanently"
                );
                (
                    Outcome::Failed,
                    NotificationLogRepo::record_failure(&self.pool, delivery.log_id, &error, None)
                        .await,
                )
            }
        };

        if let Err(e) = settled {
            // The lease expires and the row is claimed again.
            tracing::error!(log_id = delivery.log_id, error = %e, "Failed to settle delivery log");
        }
        outcome
    }
}

enum Outcome {
    Sent,
    Retried,
    Failed,
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::delivery::in_app::InAppSender;
    use crate::delivery::DeliveryError;

    struct NullSms;

    #[async_trait]
    impl ChannelSender for NullSms {
        fn channel(&self) -> Channel {
            Channel::Sms
        }

        async fn send(&self, _delivery: &ClaimedDelivery) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn channels_follow_registered_senders() {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let worker = DeliveryWorker::new(pool, DeliveryWorkerConfig::default())
            .with_sender(Arc::new(NullSms))
            .with_sender(Arc::new(InAppSender));
        assert_eq!(worker.channels(), vec![Channel::InApp, Channel::Sms]);
    }
}
