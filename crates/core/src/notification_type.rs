//! The closed set of notification categories users can toggle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    SystemUpdate,
    AccountUpdate,
    CampaignUpdate,
    ApplicationStatus,
    ReviewReminder,
    PaymentStatus,
    Marketing,
}

impl NotificationType {
    pub const ALL: [NotificationType; 7] = [
        NotificationType::SystemUpdate,
        NotificationType::AccountUpdate,
        NotificationType::CampaignUpdate,
        NotificationType::ApplicationStatus,
        NotificationType::ReviewReminder,
        NotificationType::PaymentStatus,
        NotificationType::Marketing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::SystemUpdate => "SYSTEM_UPDATE",
            NotificationType::AccountUpdate => "ACCOUNT_UPDATE",
            NotificationType::CampaignUpdate => "CAMPAIGN_UPDATE",
            NotificationType::ApplicationStatus => "APPLICATION_STATUS",
            NotificationType::ReviewReminder => "REVIEW_REMINDER",
            NotificationType::PaymentStatus => "PAYMENT_STATUS",
            NotificationType::Marketing => "MARKETING",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown notification type '{s}'")))
    }
}
