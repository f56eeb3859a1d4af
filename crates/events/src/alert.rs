//! Operational alerting for dispatches that could not be completed.

use async_trait::async_trait;
use reviewhub_core::types::DbId;

/// A dispatch that failed permanently or ran out of attempts.
#[derive(Debug, Clone)]
pub struct DispatchAlert {
    pub outbox_id: Option<DbId>,
    pub event_kind: String,
    pub idempotency_key: String,
    /// Attempts spent by the reporter; a permanent failure reports 1.
    pub attempts: u32,
    pub error: String,
}

/// Receives dispatch failures that need a human.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn raise(&self, alert: DispatchAlert);
}

/// Default sink: an ERROR-level log line with every alert field.
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn raise(&self, alert: DispatchAlert) {
        tracing::error!(
            outbox_id = alert.outbox_id,
            event_kind = %alert.event_kind,
            idempotency_key = %alert.idempotency_key,
            attempts = alert.attempts,
            error = %alert.error,
            "Notification dispatch failed permanently"
        );
    }
}
