//! In-app feed delivery.
//!
//! The stored notification row already is the in-app feed entry, so
//! delivering it only settles the log row.

use async_trait::async_trait;
use reviewhub_core::channels::Channel;
use reviewhub_db::models::notification::ClaimedDelivery;

use super::{ChannelSender, DeliveryError};

pub struct InAppSender;

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    async fn send(&self, delivery: &ClaimedDelivery) -> Result<(), DeliveryError> {
        tracing::debug!(
            user_id = delivery.user_id,
            notification_id = delivery.notification_id,
            "In-app notification available in feed"
        );
        Ok(())
    }
}
