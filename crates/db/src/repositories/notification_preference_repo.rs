//! Repository for the `notification_preferences` table.
//!
//! A user has at most one row per notification type. Rows are materialized
//! lazily: the first read for a `(user, type)` pair inserts the default (all
//! channels enabled) and every later read, concurrent or not, observes that
//! same row.

use reviewhub_core::channels::ChannelSet;
use reviewhub_core::notification_type::NotificationType;
use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::notification::{NotificationPreference, PreferenceUpdate};

/// Column list for `notification_preferences` queries.
const COLUMNS: &str =
    "id, user_id, notification_type, is_enabled, channels, created_at, updated_at";

pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    /// Return the user's preference for `notification_type`, creating the
    /// default row on first access.
    ///
    /// The conflict arm rewrites `is_enabled` with its own value so that
    /// `RETURNING` yields the existing row; an existing row is never changed.
    pub async fn resolve(
        conn: &mut PgConnection,
        user_id: DbId,
        notification_type: NotificationType,
    ) -> Result<NotificationPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences \
                (user_id, notification_type, is_enabled, channels) \
             VALUES ($1, $2, true, $3) \
             ON CONFLICT (user_id, notification_type) DO UPDATE SET \
                is_enabled = notification_preferences.is_enabled \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .bind(notification_type.as_str())
            .bind(ChannelSet::all().to_json())
            .fetch_one(conn)
            .await
    }

    /// Every notification type's preference for a user, materializing any
    /// missing defaults first. Ordered by type name.
    pub async fn list_resolved(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<NotificationPreference>, sqlx::Error> {
        let types: Vec<&str> = NotificationType::ALL.iter().map(|t| t.as_str()).collect();
        sqlx::query(
            "INSERT INTO notification_preferences \
                (user_id, notification_type, is_enabled, channels) \
             SELECT $1, t, true, $3 FROM UNNEST($2::text[]) AS t \
             ON CONFLICT (user_id, notification_type) DO NOTHING",
        )
        .bind(user_id)
        .bind(&types)
        .bind(ChannelSet::all().to_json())
        .execute(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM notification_preferences \
             WHERE user_id = $1 \
             ORDER BY notification_type"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the given types' preferences in one transaction.
    ///
    /// Types not mentioned in `updates` keep their current settings.
    pub async fn replace(
        pool: &PgPool,
        user_id: DbId,
        updates: &[PreferenceUpdate],
    ) -> Result<Vec<NotificationPreference>, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences \
                (user_id, notification_type, is_enabled, channels) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, notification_type) DO UPDATE SET \
                is_enabled = EXCLUDED.is_enabled, \
                channels = EXCLUDED.channels, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut saved = Vec::with_capacity(updates.len());
        for update in updates {
            let pref = sqlx::query_as::<_, NotificationPreference>(&query)
                .bind(user_id)
                .bind(update.notification_type.as_str())
                .bind(update.is_enabled)
                .bind(update.channels.to_json())
                .fetch_one(&mut *tx)
                .await?;
            saved.push(pref);
        }
        tx.commit().await?;
        Ok(saved)
    }
}
