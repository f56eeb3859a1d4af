//! SMTP delivery of notification emails through `lettre`.
//!
//! Email is optional: without `SMTP_HOST` no [`EmailSender`] is registered
//! and `email` log rows simply stay queued.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reviewhub_core::channels::Channel;
use reviewhub_db::models::notification::ClaimedDelivery;

use super::{ChannelSender, DeliveryError};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not assemble email: {0}")]
    Message(#[from] lettre::error::Error),
}

impl EmailError {
    /// Only transient SMTP replies (4xx, connection trouble) are worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmailError::Smtp(e) if !e.is_permanent())
    }
}

/// SMTP relay settings, read from `SMTP_HOST`, `SMTP_PORT` (587),
/// `SMTP_FROM`, `SMTP_USER` and `SMTP_PASSWORD`.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub relay: String,
    pub port: u16,
    /// `From` mailbox, e.g. `ReviewHub <noreply@reviewhub.local>`.
    pub from: String,
    /// Username and password; both must be set for authentication.
    pub credentials: Option<(String, String)>,
}

impl EmailConfig {
    /// `None` when `SMTP_HOST` is unset.
    pub fn from_env() -> Option<Self> {
        let relay = std::env::var("SMTP_HOST").ok()?;
        let port = match std::env::var("SMTP_PORT") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "SMTP_PORT is not a port number, using 587");
                587
            }),
            Err(_) => 587,
        };
        let credentials = match (std::env::var("SMTP_USER"), std::env::var("SMTP_PASSWORD")) {
            (Ok(user), Ok(password)) => Some((user, password)),
            _ => None,
        };

        Some(Self {
            relay,
            port,
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "ReviewHub <noreply@reviewhub.local>".to_string()),
            credentials,
        })
    }
}

/// The email [`ChannelSender`].
pub struct EmailSender {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSender {
    /// Validate the sender mailbox and build the pooled STARTTLS transport.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config.from.parse()?;
        let mut transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)?.port(config.port);
        if let Some((user, password)) = config.credentials {
            transport = transport.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            from,
            mailer: transport.build(),
        })
    }

    /// Plain text with an HTML alternative carrying the same text.
    pub fn compose(&self, delivery: &ClaimedDelivery) -> Result<Message, EmailError> {
        let html = format!(
            "<h2>{}</h2>\n<p>{}</p>",
            escape_html(&delivery.title),
            escape_html(&delivery.content)
        );
        let message = Message::builder()
            .from(self.from.clone())
            .to(delivery.email.parse()?)
            .subject(format!("[ReviewHub] {}", delivery.title))
            .multipart(MultiPart::alternative_plain_html(delivery.content.clone(), html))?;
        Ok(message)
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, delivery: &ClaimedDelivery) -> Result<(), DeliveryError> {
        let message = self.compose(delivery)?;
        self.mailer.send(message).await.map_err(EmailError::from)?;
        tracing::info!(
            notification_id = delivery.notification_id,
            user_id = delivery.user_id,
            "Notification email sent"
        );
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
