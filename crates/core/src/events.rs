//! Domain events that produce user notifications.
//!
//! [`DomainEvent`] is a closed, tagged enum: every event kind carries exactly
//! the fields the dispatcher needs, so recipient resolution, type mapping and
//! rendering are exhaustive matches rather than lookups into a loose JSON map.
//!
//! Every event has a stable natural identity ([`DomainEvent::idempotency_key`])
//! that is reused as the unique key of the resulting notification row, making
//! repeated delivery of the same event harmless.

use serde::{Deserialize, Serialize};

use crate::notification_type::NotificationType;
use crate::status::{ApplicationStatus, CampaignStatus};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    ApplicationCreated {
        application_id: DbId,
        campaign_id: DbId,
        user_id: DbId,
        campaign_title: String,
    },
    ApplicationStatusChanged {
        application_id: DbId,
        campaign_id: DbId,
        user_id: DbId,
        campaign_title: String,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    /// One event per affected applicant; `revision` identifies the campaign edit.
    CampaignUpdated {
        campaign_id: DbId,
        user_id: DbId,
        campaign_title: String,
        revision: i32,
        status: CampaignStatus,
    },
    ReviewDeadlineApproaching {
        application_id: DbId,
        campaign_id: DbId,
        user_id: DbId,
        campaign_title: String,
        deadline: Timestamp,
    },
    PaymentSettled {
        payment_ref: String,
        user_id: DbId,
        amount_cents: i64,
        currency: String,
        succeeded: bool,
    },
}

/// Human-readable title and body for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub title: String,
    pub content: String,
}

impl DomainEvent {
    /// Snake-case kind name, matching the serde tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::ApplicationCreated { .. } => "application_created",
            DomainEvent::ApplicationStatusChanged { .. } => "application_status_changed",
            DomainEvent::CampaignUpdated { .. } => "campaign_updated",
            DomainEvent::ReviewDeadlineApproaching { .. } => "review_deadline_approaching",
            DomainEvent::PaymentSettled { .. } => "payment_settled",
        }
    }

    /// The user who receives the notification.
    pub fn recipient(&self) -> DbId {
        match self {
            DomainEvent::ApplicationCreated { user_id, .. }
            | DomainEvent::ApplicationStatusChanged { user_id, .. }
            | DomainEvent::CampaignUpdated { user_id, .. }
            | DomainEvent::ReviewDeadlineApproaching { user_id, .. }
            | DomainEvent::PaymentSettled { user_id, .. } => *user_id,
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            DomainEvent::ApplicationCreated { .. } | DomainEvent::ApplicationStatusChanged { .. } => {
                NotificationType::ApplicationStatus
            }
            DomainEvent::CampaignUpdated { .. } => NotificationType::CampaignUpdate,
            DomainEvent::ReviewDeadlineApproaching { .. } => NotificationType::ReviewReminder,
            DomainEvent::PaymentSettled { .. } => NotificationType::PaymentStatus,
        }
    }

    /// Stable identity of the underlying state change.
    pub fn idempotency_key(&self) -> String {
        match self {
            DomainEvent::ApplicationCreated { application_id, .. } => {
                format!("application:{application_id}:created")
            }
            DomainEvent::ApplicationStatusChanged {
                application_id,
                from,
                to,
                ..
            } => format!("application:{application_id}:{from}->{to}"),
            DomainEvent::CampaignUpdated {
                campaign_id,
                user_id,
                revision,
                ..
            } => format!("campaign:{campaign_id}:r{revision}:user:{user_id}"),
            DomainEvent::ReviewDeadlineApproaching {
                application_id,
                deadline,
                ..
            } => format!(
                "review-reminder:{application_id}:{}",
                deadline.date_naive()
            ),
            DomainEvent::PaymentSettled {
                payment_ref,
                succeeded,
                ..
            } => {
                let outcome = if *succeeded { "succeeded" } else { "failed" };
                format!("payment:{payment_ref}:{outcome}")
            }
        }
    }

    pub fn render(&self) -> RenderedNotification {
        let (title, content) = match self {
            DomainEvent::ApplicationCreated { campaign_title, .. } => (
                "Application received".to_string(),
                format!("Your application to \"{campaign_title}\" has been received and is pending review."),
            ),
            DomainEvent::ApplicationStatusChanged {
                campaign_title, to, ..
            } => match to {
                ApplicationStatus::Accepted => (
                    "Application accepted".to_string(),
                    format!("Congratulations! Your application to \"{campaign_title}\" has been accepted."),
                ),
                ApplicationStatus::Rejected => (
                    "Application not selected".to_string(),
                    format!("Your application to \"{campaign_title}\" was not selected this time."),
                ),
                ApplicationStatus::Pending => (
                    "Application pending".to_string(),
                    format!("Your application to \"{campaign_title}\" is pending review."),
                ),
            },
            DomainEvent::CampaignUpdated {
                campaign_title,
                status,
                ..
            } => (
                "Campaign updated".to_string(),
                match status {
                    CampaignStatus::Completed => {
                        format!("\"{campaign_title}\" has ended.")
                    }
                    _ => format!("\"{campaign_title}\" has been updated. Check the latest details."),
                },
            ),
            DomainEvent::ReviewDeadlineApproaching {
                campaign_title,
                deadline,
                ..
            } => (
                "Review due soon".to_string(),
                format!(
                    "Please submit your review for \"{campaign_title}\" before {}.",
                    deadline.format("%Y-%m-%d %H:%M UTC")
                ),
            ),
            DomainEvent::PaymentSettled {
                amount_cents,
                currency,
                succeeded,
                ..
            } => {
                let amount = format_amount(*amount_cents, currency);
                if *succeeded {
                    ("Payment completed".to_string(), format!("Your payment of {amount} was successful."))
                } else {
                    ("Payment failed".to_string(), format!("Your payment of {amount} could not be completed."))
                }
            }
        };
        RenderedNotification { title, content }
    }

    /// Structured payload stored in `notifications.metadata`.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Reminders are pointless once the deadline has passed.
    pub fn expires_at(&self) -> Option<Timestamp> {
        match self {
            DomainEvent::ReviewDeadlineApproaching { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }
}

/// `-1.50 USD` style amount from minor units; the sign is printed once.
fn format_amount(amount_cents: i64, currency: &str) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
}
