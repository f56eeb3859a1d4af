//! Repository for the `applications` table.
//!
//! Inserts and status writes take `&mut PgConnection` because they only make
//! sense inside the admission or decision transaction that also holds the
//! relevant row lock and writes the outbox event.

use reviewhub_core::status::ApplicationStatus;
use reviewhub_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::application::{Application, ReviewReminderCandidate};

/// Column list for `applications` queries.
const COLUMNS: &str =
    "id, campaign_id, user_id, status_id, decided_by, decided_at, created_at, updated_at";

/// Unique constraint backing "one application per user per campaign".
pub const UQ_CAMPAIGN_USER: &str = "uq_applications_campaign_user";

pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert a new PENDING application.
    pub async fn insert_pending(
        conn: &mut PgConnection,
        campaign_id: DbId,
        user_id: DbId,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications (campaign_id, user_id, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .bind(ApplicationStatus::Pending.id())
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_for_user(
        conn: &mut PgConnection,
        campaign_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications WHERE campaign_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Read the application and take its row lock for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Write a decided status. The caller must hold the row lock and have
    /// validated the transition.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: ApplicationStatus,
        decided_by: Option<DbId>,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "UPDATE applications \
             SET status_id = $2, decided_by = $3, decided_at = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(status.id())
            .bind(decided_by)
            .fetch_one(conn)
            .await
    }

    /// Reject every still-PENDING application of a campaign that is being closed.
    pub async fn reject_pending_for_campaign(
        conn: &mut PgConnection,
        campaign_id: DbId,
        decided_by: Option<DbId>,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications \
             SET status_id = $2, decided_by = $3, decided_at = NOW(), updated_at = NOW() \
             WHERE campaign_id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(campaign_id)
            .bind(ApplicationStatus::Rejected.id())
            .bind(decided_by)
            .bind(ApplicationStatus::Pending.id())
            .fetch_all(conn)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Accepted applications with no review whose campaign ends in `(now, until]`.
    pub async fn list_due_for_review_reminder(
        pool: &PgPool,
        now: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<ReviewReminderCandidate>, sqlx::Error> {
        sqlx::query_as::<_, ReviewReminderCandidate>(
            "SELECT a.id AS application_id, a.campaign_id, a.user_id, \
                    c.title AS campaign_title, c.end_date \
             FROM applications a \
             JOIN campaigns c ON c.id = a.campaign_id \
             LEFT JOIN reviews r ON r.application_id = a.id \
             WHERE a.status_id = $1 \
               AND r.id IS NULL \
               AND c.end_date > $2 AND c.end_date <= $3 \
             ORDER BY c.end_date, a.id",
        )
        .bind(ApplicationStatus::Accepted.id())
        .bind(now)
        .bind(until)
        .fetch_all(pool)
        .await
    }
}
