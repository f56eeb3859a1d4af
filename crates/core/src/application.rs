//! Application state machine.
//!
//! ```text
//! PENDING ──► ACCEPTED   (terminal)
//!    └──────► REJECTED   (terminal)
//! ```
//!
//! Only PENDING and ACCEPTED applications hold a capacity slot; a rejection
//! releases it. Review text is the single thing that may still be attached
//! once an application is terminal, and only to an accepted one.

use crate::error::CoreError;
use crate::status::ApplicationStatus;

/// Maximum review body length in characters.
pub const MAX_REVIEW_LENGTH: usize = 5000;

impl ApplicationStatus {
    /// Accepted and rejected applications never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }

    /// Whether an application in this status occupies a capacity slot.
    pub fn counts_toward_capacity(self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Accepted)
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Pending, ApplicationStatus::Accepted)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
        )
    }
}

/// Statuses that count toward a campaign's `max_participants`, as database ids.
pub fn capacity_status_ids() -> Vec<i16> {
    ApplicationStatus::ALL
        .iter()
        .filter(|s| s.counts_toward_capacity())
        .map(|s| s.id())
        .collect()
}

/// Validate an application status change.
///
/// Returns the new status on success so callers can write it straight back.
pub fn validate_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<ApplicationStatus, CoreError> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(CoreError::InvalidTransition {
            entity: "application",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Validate review text before it is attached to an accepted application.
pub fn validate_review_content(content: &str) -> Result<(), CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Review content must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_REVIEW_LENGTH {
        return Err(CoreError::Validation(format!(
            "Review content must be at most {MAX_REVIEW_LENGTH} characters"
        )));
    }
    Ok(())
}
