//! Channel delivery: the consumer side of the `notification_logs` queue.
//!
//! The dispatcher only records intent as `queued` log rows. A
//! [`worker::DeliveryWorker`] leases those rows and hands each one to the
//! [`ChannelSender`] registered for its channel.

use async_trait::async_trait;
use reviewhub_core::channels::Channel;
use reviewhub_db::models::notification::ClaimedDelivery;

pub mod email;
pub mod in_app;
pub mod webpush;
pub mod worker;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a single channel delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] email::EmailError),

    #[error(transparent)]
    WebPush(#[from] webpush::WebPushError),

    /// The claimed row cannot be delivered by this sender.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

impl DeliveryError {
    /// Whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Email(e) => e.is_retryable(),
            DeliveryError::WebPush(e) => e.is_retryable(),
            DeliveryError::Rejected(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelSender
// ---------------------------------------------------------------------------

/// Delivers notifications over one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(&self, delivery: &ClaimedDelivery) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_is_not_retryable() {
        let err = DeliveryError::Rejected("no address".into());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Delivery rejected: no address");
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = DeliveryError::from(webpush::WebPushError::HttpStatus(503));
        assert!(err.is_retryable());
        let err = DeliveryError::from(webpush::WebPushError::HttpStatus(410));
        assert!(!err.is_retryable());
    }
}
