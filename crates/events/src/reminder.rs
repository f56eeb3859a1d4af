//! Review reminder scheduler.
//!
//! [`ReviewReminderScheduler`] runs as a background task and periodically
//! looks for ACCEPTED applications without a review whose campaign ends
//! within the reminder window. For each one it records a
//! `ReviewDeadlineApproaching` outbox event and publishes it on the bus.
//! The event's idempotency key is derived from the application and the
//! deadline date, so rescanning never records a second reminder.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reviewhub_core::events::DomainEvent;
use reviewhub_db::repositories::{ApplicationRepo, DomainEventRepo};
use reviewhub_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventBus, PlatformEvent};

pub struct ReviewReminderScheduler {
    pool: DbPool,
    bus: Arc<EventBus>,
    poll_interval: Duration,
    window: chrono::Duration,
}

impl ReviewReminderScheduler {
    pub fn new(
        pool: DbPool,
        bus: Arc<EventBus>,
        poll_interval: Duration,
        window: chrono::Duration,
    ) -> Self {
        Self {
            pool,
            bus,
            poll_interval,
            window,
        }
    }

    /// Run the scheduler loop.
    ///
    /// The loop exits gracefully when the provided [`CancellationToken`] is
    /// cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Review reminder scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.scan().await {
                        tracing::error!(error = %e, "Failed to scan for review reminders");
                    }
                }
            }
        }
    }

    /// Record reminders for every due application not reminded yet.
    ///
    /// Returns the number of new reminder events.
    pub async fn scan(&self) -> Result<usize, sqlx::Error> {
        let now = Utc::now();
        let due =
            ApplicationRepo::list_due_for_review_reminder(&self.pool, now, now + self.window)
                .await?;

        let mut recorded = 0;
        let mut conn = self.pool.acquire().await?;
        for candidate in due {
            let event = DomainEvent::ReviewDeadlineApproaching {
                application_id: candidate.application_id,
                campaign_id: candidate.campaign_id,
                user_id: candidate.user_id,
                campaign_title: candidate.campaign_title,
                deadline: candidate.end_date,
            };
            if let Some(outbox_id) = DomainEventRepo::insert(&mut conn, &event, None).await? {
                self.bus
                    .publish(PlatformEvent::new(event).with_outbox_id(outbox_id));
                recorded += 1;
            }
        }

        if recorded > 0 {
            tracing::info!(count = recorded, "Recorded review reminders");
        }

        Ok(recorded)
    }
}
