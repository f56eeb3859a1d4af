//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument, or `&mut PgConnection` when the statement
//! must join a caller-owned transaction.

pub mod application_repo;
pub mod campaign_repo;
pub mod capacity_ledger;
pub mod domain_event_repo;
pub mod notification_log_repo;
pub mod notification_preference_repo;
pub mod notification_repo;
pub mod review_repo;
pub mod user_repo;

pub use application_repo::ApplicationRepo;
pub use campaign_repo::CampaignRepo;
pub use capacity_ledger::{CapacityExceeded, CapacityLedger, Reservation};
pub use domain_event_repo::DomainEventRepo;
pub use notification_log_repo::NotificationLogRepo;
pub use notification_preference_repo::NotificationPreferenceRepo;
pub use notification_repo::NotificationRepo;
pub use review_repo::ReviewRepo;
pub use user_repo::UserRepo;
