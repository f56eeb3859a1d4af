//! Web push delivery through an HTTP push gateway.
//!
//! [`WebPushSender`] POSTs a JSON payload for each delivery to the
//! configured gateway endpoint (`WEB_PUSH_ENDPOINT`), one request per call.
//! Transport failures, `429` and `5xx` responses are reported as retryable
//! and the [`DeliveryWorker`](super::worker::DeliveryWorker) backs off and
//! claims the row again; other non-2xx responses are permanent.

use std::time::Duration;

use async_trait::async_trait;
use reviewhub_core::channels::Channel;
use reviewhub_db::models::notification::ClaimedDelivery;

use super::{ChannelSender, DeliveryError};

/// HTTP request timeout for a single delivery attempt. Must stay well under
/// the worker lease so a slow gateway cannot outlive the claim.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for web push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebPushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push gateway returned a non-2xx status code.
    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),
}

impl WebPushError {
    pub fn is_retryable(&self) -> bool {
        match self {
            WebPushError::Request(_) => true,
            WebPushError::HttpStatus(code) => *code == 429 || *code >= 500,
        }
    }
}

// ---------------------------------------------------------------------------
// WebPushSender
// ---------------------------------------------------------------------------

pub struct WebPushSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebPushSender {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, WebPushError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Deliver one push payload with a single POST.
    pub async fn push(&self, delivery: &ClaimedDelivery) -> Result<(), WebPushError> {
        let payload = serde_json::json!({
            "user_id": delivery.user_id,
            "notification_id": delivery.notification_id,
            "title": delivery.title,
            "body": delivery.content,
            "data": delivery.metadata,
        });

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        if !response.status().is_success() {
            let err = WebPushError::HttpStatus(response.status().as_u16());
            tracing::warn!(
                endpoint = %self.endpoint,
                notification_id = delivery.notification_id,
                retryable = err.is_retryable(),
                error = %err,
                "Web push delivery failed"
            );
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelSender for WebPushSender {
    fn channel(&self) -> Channel {
        Channel::WebPush
    }

    async fn send(&self, delivery: &ClaimedDelivery) -> Result<(), DeliveryError> {
        self.push(delivery).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
