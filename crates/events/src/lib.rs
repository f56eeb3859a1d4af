//! ReviewHub event bus and notification infrastructure.
//!
//! This crate turns committed domain events into user notifications and
//! drives their delivery:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying [`PlatformEvent`] envelopes.
//! - [`NotificationDispatcher`]: converts one [`DomainEvent`] into a
//!   notification row plus one queued delivery log per enabled channel.
//! - [`NotificationRouter`]: bus consumer that dispatches with timeout and
//!   backoff, then settles the event's outbox row.
//! - [`OutboxRelay`]: periodic sweep over undispatched outbox rows, covering
//!   bus lag and restarts.
//! - [`ReviewReminderScheduler`]: records review-deadline events.
//! - [`delivery`]: channel senders (in-app, email, web push) and the
//!   [`DeliveryWorker`] that drains queued delivery logs.
//!
//! [`DomainEvent`]: reviewhub_core::events::DomainEvent

pub mod alert;
pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod outbox;
pub mod reminder;
pub mod router;

pub use alert::{AlertSink, DispatchAlert, TracingAlertSink};
pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailSender};
pub use delivery::in_app::InAppSender;
pub use delivery::webpush::WebPushSender;
pub use delivery::worker::{DeliveryWorker, DeliveryWorkerConfig};
pub use delivery::{ChannelSender, DeliveryError};
pub use dispatcher::{DispatchError, DispatchResult, NotificationDispatcher};
pub use outbox::{OutboxRelay, OutboxRelayConfig};
pub use reminder::ReviewReminderScheduler;
pub use router::NotificationRouter;
