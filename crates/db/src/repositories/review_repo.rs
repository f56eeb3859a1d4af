//! Repository for the `reviews` table.

use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::application::Review;

/// Column list for `reviews` queries.
const COLUMNS: &str = "id, application_id, content, created_at";

/// Unique constraint making a review a one-time attachment.
pub const UQ_APPLICATION: &str = "uq_reviews_application";

pub struct ReviewRepo;

impl ReviewRepo {
    /// Attach a review. Fails with a unique violation on [`UQ_APPLICATION`]
    /// if the application already has one.
    pub async fn create(
        conn: &mut PgConnection,
        application_id: DbId,
        content: &str,
    ) -> Result<Review, sqlx::Error> {
        let query = format!(
            "INSERT INTO reviews (application_id, content) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(application_id)
            .bind(content)
            .fetch_one(conn)
            .await
    }

    pub async fn find_for_application(
        pool: &PgPool,
        application_id: DbId,
    ) -> Result<Option<Review>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reviews WHERE application_id = $1");
        sqlx::query_as::<_, Review>(&query)
            .bind(application_id)
            .fetch_optional(pool)
            .await
    }
}
