//! Campaign lifecycle rules and the admission open-window check.

use crate::error::CoreError;
use crate::status::CampaignStatus;
use crate::types::{DbId, Timestamp};

/// The fields of a campaign that decide whether it accepts applications.
#[derive(Debug, Clone, Copy)]
pub struct CampaignSchedule {
    pub status: CampaignStatus,
    pub is_visible: bool,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

impl CampaignSchedule {
    /// Whether applications are accepted at `now`.
    ///
    /// The campaign must be visible, `ONGOING`, and `now` must fall inside
    /// `[start_date, end_date]` (both ends inclusive).
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.is_visible
            && self.status == CampaignStatus::Ongoing
            && self.start_date <= now
            && now <= self.end_date
    }

    pub fn ensure_open(&self, campaign_id: DbId, now: Timestamp) -> Result<(), CoreError> {
        if self.is_open_at(now) {
            Ok(())
        } else {
            Err(CoreError::CampaignNotOpen { campaign_id })
        }
    }
}

impl CampaignStatus {
    /// Campaign lifecycle only moves forward.
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        matches!(
            (self, next),
            (CampaignStatus::Pending, CampaignStatus::Ongoing)
                | (CampaignStatus::Pending, CampaignStatus::Completed)
                | (CampaignStatus::Ongoing, CampaignStatus::Completed)
        )
    }
}

pub fn validate_campaign_transition(
    from: CampaignStatus,
    to: CampaignStatus,
) -> Result<(), CoreError> {
    if from == to || from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "campaign",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

pub fn validate_window(start_date: Timestamp, end_date: Timestamp) -> Result<(), CoreError> {
    if start_date > end_date {
        return Err(CoreError::Validation(
            "start_date must not be after end_date".into(),
        ));
    }
    Ok(())
}

/// Validate a capacity value, optionally against the slots already reserved.
///
/// Capacity may never drop below the number of live reservations; that would
/// leave the campaign over-subscribed.
pub fn validate_max_participants(
    max_participants: i32,
    reserved: Option<i64>,
) -> Result<(), CoreError> {
    if max_participants < 1 {
        return Err(CoreError::Validation(
            "max_participants must be a positive integer".into(),
        ));
    }
    if let Some(reserved) = reserved {
        if i64::from(max_participants) < reserved {
            return Err(CoreError::Validation(format!(
                "max_participants ({max_participants}) cannot be lower than the \
                 {reserved} applications already holding a slot"
            )));
        }
    }
    Ok(())
}
