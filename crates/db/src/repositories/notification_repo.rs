//! Repository for the `notifications` table.
//!
//! Rows are created only by the dispatcher, keyed by the event's idempotency
//! key. After that the owning user may flip `is_read` (false to true only) or
//! delete the row.

use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::notification::{NewNotification, Notification};

const COLUMNS: &str = "id, user_id, notification_type, title, content, channels, metadata, \
    is_read, read_at, idempotency_key, expires_at, created_at";

/// `$1` is the owner, `$2` restricts to unread rows. Expired rows never show.
const FEED_FILTER: &str = "user_id = $1 \
    AND (expires_at IS NULL OR expires_at > NOW()) \
    AND (NOT $2::BOOLEAN OR is_read = false)";

pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification unless one with the same idempotency key exists.
    ///
    /// Returns the new id, or `None` when the key was already taken.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        input: &NewNotification,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications \
                (user_id, notification_type, title, content, channels, metadata, \
                 idempotency_key, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (idempotency_key) DO NOTHING \
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.notification_type.as_str())
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.channels.to_json())
        .bind(&input.metadata)
        .bind(&input.idempotency_key)
        .bind(input.expires_at)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_id_by_idempotency_key(
        conn: &mut PgConnection,
        idempotency_key: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM notifications WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(conn)
            .await
    }

    /// The caller's feed, newest first, optionally unread only.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications WHERE {FEED_FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Size of the same feed, ignoring paging.
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM notifications WHERE {FEED_FILTER}");
        sqlx::query_scalar(&query)
            .bind(user_id)
            .bind(unread_only)
            .fetch_one(pool)
            .await
    }

    /// `false` when the row is missing or someone else's. Re-reading keeps
    /// the first `read_at`.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns how many rows flipped.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        Self::count_for_user(pool, user_id, true).await
    }

    /// Delete one of the user's notifications. Returns `false` if not found.
    pub async fn delete(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
