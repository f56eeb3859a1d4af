//! Application and review entity models.

use reviewhub_core::error::CoreError;
use reviewhub_core::status::{ApplicationStatus, StatusId};
use reviewhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: DbId,
    pub status_id: StatusId,
    pub decided_by: Option<DbId>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Application {
    pub fn status(&self) -> Result<ApplicationStatus, CoreError> {
        ApplicationStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Internal(format!("Unknown application status id {}", self.status_id))
        })
    }

    /// API representation with the status spelled out.
    pub fn view(&self) -> Result<ApplicationView, CoreError> {
        Ok(ApplicationView {
            id: self.id,
            campaign_id: self.campaign_id,
            user_id: self.user_id,
            status: self.status()?,
            decided_at: self.decided_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: DbId,
    pub status: ApplicationStatus,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for an administrative status decision.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApplicationStatus {
    pub status: ApplicationStatus,
}

/// A row from the `reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: DbId,
    pub application_id: DbId,
    pub content: String,
    pub created_at: Timestamp,
}

/// DTO for submitting a review.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub content: String,
}

/// An accepted, unreviewed application whose campaign ends soon.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewReminderCandidate {
    pub application_id: DbId,
    pub campaign_id: DbId,
    pub user_id: DbId,
    pub campaign_title: String,
    pub end_date: Timestamp,
}
