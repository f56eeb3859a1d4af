//! Local mirror of identity-service accounts.

use reviewhub_core::roles::ROLE_USER;
use reviewhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

pub struct UserRepo;

impl UserRepo {
    /// Insert the account, or refresh name and role if the email is known.
    pub async fn upsert(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, display_name, role) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_users_email DO UPDATE \
                SET display_name = EXCLUDED.display_name, role = EXCLUDED.role \
             RETURNING id, email, display_name, role, created_at",
        )
        .bind(&input.email)
        .bind(&input.display_name)
        .bind(input.role.as_deref().unwrap_or(ROLE_USER))
        .fetch_one(pool)
        .await
    }

    /// Whether an account with this id has been mirrored.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
