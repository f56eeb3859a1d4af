//! Domain core for the campaign admission and notification services.
//!
//! Everything in this crate is free of I/O: identifiers, status enums and
//! their state machines, notification channel and type vocabularies, the
//! closed [`events::DomainEvent`] enum, and the retry policy shared by the
//! admission path and the notification router.

pub mod application;
pub mod campaign;
pub mod channels;
pub mod error;
pub mod events;
pub mod notification_type;
pub mod retry;
pub mod roles;
pub mod status;
pub mod types;
