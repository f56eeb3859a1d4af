//! Campaign entity model and DTOs.

use reviewhub_core::campaign::CampaignSchedule;
use reviewhub_core::error::CoreError;
use reviewhub_core::status::{CampaignStatus, StatusId};
use reviewhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub title: String,
    pub max_participants: i32,
    pub status_id: StatusId,
    pub is_visible: bool,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// Bumped on every administrative edit; part of `CampaignUpdated` identity.
    pub revision: i32,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Campaign {
    pub fn status(&self) -> Result<CampaignStatus, CoreError> {
        CampaignStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Internal(format!("Unknown campaign status id {}", self.status_id))
        })
    }

    pub fn schedule(&self) -> Result<CampaignSchedule, CoreError> {
        Ok(CampaignSchedule {
            status: self.status()?,
            is_visible: self.is_visible,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// DTO for creating a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub title: String,
    pub max_participants: i32,
    pub status: Option<CampaignStatus>,
    pub is_visible: Option<bool>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

/// DTO for editing a campaign. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaign {
    pub title: Option<String>,
    pub max_participants: Option<i32>,
    pub status: Option<CampaignStatus>,
    pub is_visible: Option<bool>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// Live capacity figures for a campaign, computed from application rows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CapacitySnapshot {
    pub campaign_id: DbId,
    pub max_participants: i32,
    pub reserved: i64,
    pub remaining: i64,
}
