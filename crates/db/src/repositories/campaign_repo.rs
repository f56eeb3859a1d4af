//! Repository for the `campaigns` table.
//!
//! Every write that can affect admission (status, capacity, window,
//! visibility) goes through [`CampaignRepo::lock`] first, so edits and
//! admissions for the same campaign serialize on one row lock.

use reviewhub_core::application::capacity_status_ids;
use reviewhub_core::status::CampaignStatus;
use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};

/// Column list for `campaigns` queries.
const COLUMNS: &str = "id, title, max_participants, status_id, is_visible, \
    start_date, end_date, revision, created_by, created_at, updated_at";

pub struct CampaignRepo;

impl CampaignRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateCampaign,
        created_by: Option<DbId>,
    ) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns \
                (title, max_participants, status_id, is_visible, start_date, end_date, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(&input.title)
            .bind(input.max_participants)
            .bind(input.status.unwrap_or(CampaignStatus::Pending).id())
            .bind(input.is_visible.unwrap_or(true))
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Read the campaign and take its row lock for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Apply an edit and bump `revision`. The caller must hold the row lock.
    ///
    /// Uses `COALESCE` to only overwrite fields that are `Some` in the input.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateCampaign,
    ) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET \
                title = COALESCE($2, title), \
                max_participants = COALESCE($3, max_participants), \
                status_id = COALESCE($4, status_id), \
                is_visible = COALESCE($5, is_visible), \
                start_date = COALESCE($6, start_date), \
                end_date = COALESCE($7, end_date), \
                revision = revision + 1, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(input.title.as_deref())
            .bind(input.max_participants)
            .bind(input.status.map(CampaignStatus::id))
            .bind(input.is_visible)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(conn)
            .await
    }

    /// Users whose application currently holds a slot in the campaign.
    pub async fn list_participant_user_ids(
        conn: &mut PgConnection,
        campaign_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM applications \
             WHERE campaign_id = $1 AND status_id = ANY($2) \
             ORDER BY id",
        )
        .bind(campaign_id)
        .bind(capacity_status_ids())
        .fetch_all(conn)
        .await
    }
}
