//! Repository for the `domain_events` outbox.
//!
//! State-changing transactions append their event here before commit. A row
//! stays pending until either the in-process notification router or the
//! outbox relay dispatches it and calls
//! [`mark_dispatched`](DomainEventRepo::mark_dispatched).

use std::time::Duration;

use reviewhub_core::events::DomainEvent;
use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::domain_event::StoredEvent;

/// Column list for `domain_events` queries.
const COLUMNS: &str = "id, event_kind, idempotency_key, payload, actor_user_id, attempts, \
    last_error, dispatched_at, created_at";

pub struct DomainEventRepo;

impl DomainEventRepo {
    /// Append an event to the outbox inside the caller's transaction.
    ///
    /// Returns `None` if an event with the same idempotency key was already
    /// recorded, in which case nothing is written.
    pub async fn insert(
        conn: &mut PgConnection,
        event: &DomainEvent,
        actor_user_id: Option<DbId>,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let payload = serde_json::to_value(event)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query_scalar(
            "INSERT INTO domain_events (event_kind, idempotency_key, payload, actor_user_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (idempotency_key) DO NOTHING \
             RETURNING id",
        )
        .bind(event.kind())
        .bind(event.idempotency_key())
        .bind(payload)
        .bind(actor_user_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StoredEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM domain_events WHERE id = $1");
        sqlx::query_as::<_, StoredEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark an event handled. Idempotent; the first timestamp wins.
    pub async fn mark_dispatched(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE domain_events \
             SET dispatched_at = COALESCE(dispatched_at, NOW()), locked_until = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count a failed dispatch and release the lease. Returns the new attempt count.
    pub async fn record_failure(pool: &PgPool, id: DbId, error: &str) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE domain_events \
             SET attempts = attempts + 1, last_error = $2, locked_until = NULL \
             WHERE id = $1 \
             RETURNING attempts",
        )
        .bind(id)
        .bind(error)
        .fetch_one(pool)
        .await
    }

    /// Record a failure that retrying cannot fix and park the row at the
    /// attempt limit so no relay claims it again.
    pub async fn give_up(
        pool: &PgPool,
        id: DbId,
        error: &str,
        max_attempts: i32,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE domain_events \
             SET attempts = GREATEST(attempts + 1, $3), last_error = $2, locked_until = NULL \
             WHERE id = $1 \
             RETURNING attempts",
        )
        .bind(id)
        .bind(error)
        .bind(max_attempts)
        .fetch_one(pool)
        .await
    }

    /// Lease pending events older than `grace` that still have attempts left.
    ///
    /// `grace` leaves room for the in-process router to handle fresh events
    /// first. Leased rows are hidden from other relays for `lease`.
    pub async fn claim_pending(
        pool: &PgPool,
        grace: Duration,
        max_attempts: i32,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<StoredEvent>, sqlx::Error> {
        let query = format!(
            "UPDATE domain_events \
             SET locked_until = NOW() + make_interval(secs => $4) \
             WHERE id IN ( \
                 SELECT id FROM domain_events \
                 WHERE dispatched_at IS NULL \
                   AND attempts < $2 \
                   AND created_at <= NOW() - make_interval(secs => $1) \
                   AND (locked_until IS NULL OR locked_until < NOW()) \
                 ORDER BY created_at, id \
                 LIMIT $3 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let mut claimed = sqlx::query_as::<_, StoredEvent>(&query)
            .bind(grace.as_secs_f64())
            .bind(max_attempts)
            .bind(limit)
            .bind(lease.as_secs_f64())
            .fetch_all(pool)
            .await?;
        claimed.sort_by_key(|e| (e.created_at, e.id));
        Ok(claimed)
    }

    /// Events that exhausted their attempts without being dispatched.
    pub async fn count_stranded(pool: &PgPool, max_attempts: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM domain_events WHERE dispatched_at IS NULL AND attempts >= $1",
        )
        .bind(max_attempts)
        .fetch_one(pool)
        .await
    }
}
