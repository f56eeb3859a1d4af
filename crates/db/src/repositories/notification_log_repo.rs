//! Repository for the `notification_logs` table.
//!
//! The dispatcher appends one `queued` row per channel. Channel workers
//! lease queued rows with [`NotificationLogRepo::claim_queued`] and settle
//! them as `sent` or `failed`; nothing else writes to this table.

use std::time::Duration;

use reviewhub_core::channels::Channel;
use reviewhub_core::status::DeliveryStatus;
use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::notification::{ClaimedDelivery, NotificationLog};

/// Column list for `notification_logs` queries.
const COLUMNS: &str = "id, notification_id, channel, status_id, attempts, error_message, \
    next_attempt_at, created_at, delivered_at";

pub struct NotificationLogRepo;

impl NotificationLogRepo {
    /// Append a queued delivery row; a no-op if the channel is already logged.
    ///
    /// Returns `true` when a row was inserted.
    pub async fn insert_queued(
        conn: &mut PgConnection,
        notification_id: DbId,
        channel: Channel,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notification_logs (notification_id, channel, status_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (notification_id, channel) DO NOTHING",
        )
        .bind(notification_id)
        .bind(channel.as_str())
        .bind(DeliveryStatus::Queued.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_notification(
        pool: &PgPool,
        notification_id: DbId,
    ) -> Result<Vec<NotificationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_logs \
             WHERE notification_id = $1 \
             ORDER BY channel"
        );
        sqlx::query_as::<_, NotificationLog>(&query)
            .bind(notification_id)
            .fetch_all(pool)
            .await
    }

    /// Lease up to `limit` due, queued deliveries on the given channels.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never claim
    /// the same row, then pushes `next_attempt_at` forward by `lease` so a
    /// crashed worker's rows become claimable again afterwards.
    pub async fn claim_queued(
        pool: &PgPool,
        channels: &[Channel],
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<ClaimedDelivery>, sqlx::Error> {
        let channel_names: Vec<&str> = channels.iter().map(|c| c.as_str()).collect();
        sqlx::query_as::<_, ClaimedDelivery>(
            "WITH claimed AS ( \
                 UPDATE notification_logs \
                 SET attempts = attempts + 1, \
                     next_attempt_at = NOW() + make_interval(secs => $4) \
                 WHERE id IN ( \
                     SELECT id FROM notification_logs \
                     WHERE status_id = $1 AND channel = ANY($2) AND next_attempt_at <= NOW() \
                     ORDER BY next_attempt_at, id \
                     LIMIT $3 \
                     FOR UPDATE SKIP LOCKED \
                 ) \
                 RETURNING id, notification_id, channel, attempts \
             ) \
             SELECT c.id AS log_id, c.notification_id, c.channel, c.attempts, \
                    n.user_id, u.email, n.title, n.content, n.metadata \
             FROM claimed c \
             JOIN notifications n ON n.id = c.notification_id \
             JOIN users u ON u.id = n.user_id \
             ORDER BY c.id",
        )
        .bind(DeliveryStatus::Queued.id())
        .bind(channel_names)
        .bind(limit)
        .bind(lease.as_secs_f64())
        .fetch_all(pool)
        .await
    }

    pub async fn mark_sent(pool: &PgPool, log_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_logs \
             SET status_id = $2, delivered_at = NOW(), error_message = NULL \
             WHERE id = $1",
        )
        .bind(log_id)
        .bind(DeliveryStatus::Sent.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt: either schedule a retry after `retry_in`, or,
    /// when `retry_in` is `None`, settle the row as `failed`.
    pub async fn record_failure(
        pool: &PgPool,
        log_id: DbId,
        error: &str,
        retry_in: Option<Duration>,
    ) -> Result<(), sqlx::Error> {
        match retry_in {
            Some(delay) => {
                sqlx::query(
                    "UPDATE notification_logs \
                     SET error_message = $2, next_attempt_at = NOW() + make_interval(secs => $3) \
                     WHERE id = $1",
                )
                .bind(log_id)
                .bind(error)
                .bind(delay.as_secs_f64())
                .execute(pool)
                .await?;
            }
            None => {
                sqlx::query(
                    "UPDATE notification_logs SET status_id = $2, error_message = $3 WHERE id = $1",
                )
                .bind(log_id)
                .bind(DeliveryStatus::Failed.id())
                .bind(error)
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }
}
