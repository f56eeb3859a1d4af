//! Capacity ledger: enforces `reserved <= max_participants` per campaign.
//!
//! There is no cached participant counter. The reserved count is computed
//! from live application rows (PENDING and ACCEPTED) while the caller's
//! transaction holds the campaign row lock, so two admissions racing for the
//! last slot serialize and exactly one of them sees room. Rejecting an
//! application releases its slot implicitly.

use reviewhub_core::application::capacity_status_ids;
use reviewhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::campaign::CapacitySnapshot;

/// Outcome of [`CapacityLedger::try_reserve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// One more application fits; `reserved` is the count before insertion.
    Reserved { reserved: i64, max_participants: i32 },
    Rejected(CapacityExceeded),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub reserved: i64,
    pub max_participants: i32,
}

pub struct CapacityLedger;

impl CapacityLedger {
    /// Lock the campaign row and decide whether one more application fits.
    ///
    /// Must run inside the same transaction that inserts the application;
    /// the lock is held until that transaction ends. Returns
    /// `sqlx::Error::RowNotFound` if the campaign does not exist.
    pub async fn try_reserve(
        conn: &mut PgConnection,
        campaign_id: DbId,
    ) -> Result<Reservation, sqlx::Error> {
        let max_participants: i32 =
            sqlx::query_scalar("SELECT max_participants FROM campaigns WHERE id = $1 FOR UPDATE")
                .bind(campaign_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;

        let reserved = Self::reserved_count(conn, campaign_id).await?;

        if reserved < i64::from(max_participants) {
            Ok(Reservation::Reserved {
                reserved,
                max_participants,
            })
        } else {
            tracing::debug!(campaign_id, reserved, max_participants, "Campaign at capacity");
            Ok(Reservation::Rejected(CapacityExceeded {
                reserved,
                max_participants,
            }))
        }
    }

    /// Count applications currently holding a slot.
    pub async fn reserved_count(
        conn: &mut PgConnection,
        campaign_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE campaign_id = $1 AND status_id = ANY($2)",
        )
        .bind(campaign_id)
        .bind(capacity_status_ids())
        .fetch_one(conn)
        .await
    }

    /// Read-only capacity figures (no lock); `None` if the campaign is missing.
    pub async fn snapshot(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Option<CapacitySnapshot>, sqlx::Error> {
        sqlx::query_as::<_, CapacitySnapshot>(
            "SELECT c.id AS campaign_id, c.max_participants, \
                    COUNT(a.id) AS reserved, \
                    GREATEST(c.max_participants - COUNT(a.id), 0) AS remaining \
             FROM campaigns c \
             LEFT JOIN applications a \
                ON a.campaign_id = c.id AND a.status_id = ANY($2) \
             WHERE c.id = $1 \
             GROUP BY c.id",
        )
        .bind(campaign_id)
        .bind(capacity_status_ids())
        .fetch_optional(pool)
        .await
    }
}
