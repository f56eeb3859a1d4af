use std::str::FromStr;
use std::time::Duration;

use reviewhub_core::retry::RetryPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Per-task drain timeout after the listener stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub admission: AdmissionConfig,
    pub notifications: NotificationConfig,
}

/// Bounds on one admission or status-change unit of work.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Per-attempt deadline; an attempt that exceeds it is rolled back.
    pub timeout: Duration,
    /// Backoff between attempts after a transient store failure.
    pub retry: RetryPolicy,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            retry: RetryPolicy::default(),
        }
    }
}

/// Settings for the notification background services.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub dispatch_timeout: Duration,
    /// Backoff for the bus router; `max_attempts` also caps outbox retries.
    pub dispatch_retry: RetryPolicy,
    pub outbox_poll_interval: Duration,
    pub outbox_grace: Duration,
    pub reminder_poll_interval: Duration,
    pub reminder_window: chrono::Duration,
    pub delivery_poll_interval: Duration,
    /// Push gateway URL; web push delivery is disabled when unset.
    pub web_push_endpoint: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_millis(5000),
            dispatch_retry: RetryPolicy::new(
                5,
                Duration::from_millis(100),
                Duration::from_millis(5000),
            ),
            outbox_poll_interval: Duration::from_secs(30),
            outbox_grace: Duration::from_secs(30),
            reminder_poll_interval: Duration::from_secs(3600),
            reminder_window: chrono::Duration::hours(72),
            delivery_poll_interval: Duration::from_secs(5),
            web_push_endpoint: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                       |
    /// | `ADMISSION_TIMEOUT_MS`         | `5000`                     |
    /// | `ADMISSION_MAX_ATTEMPTS`       | `3`                        |
    /// | `DISPATCH_TIMEOUT_MS`          | `5000`                     |
    /// | `DISPATCH_MAX_ATTEMPTS`        | `5`                        |
    /// | `RETRY_BASE_DELAY_MS`          | `100`                      |
    /// | `RETRY_MAX_DELAY_MS`           | `5000`                     |
    /// | `OUTBOX_POLL_SECS`             | `30`                       |
    /// | `OUTBOX_GRACE_SECS`            | `30`                       |
    /// | `REVIEW_REMINDER_POLL_SECS`    | `3600`                     |
    /// | `REVIEW_REMINDER_WINDOW_HOURS` | `72`                       |
    /// | `DELIVERY_POLL_SECS`           | `5`                        |
    /// | `WEB_PUSH_ENDPOINT`            | unset (web push disabled)  |
    ///
    /// # Panics
    ///
    /// Panics on any value that does not parse, so misconfiguration fails at boot.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);
        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );
        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30);

        let base_delay = Duration::from_millis(env_or("RETRY_BASE_DELAY_MS", 100));
        let max_delay = Duration::from_millis(env_or("RETRY_MAX_DELAY_MS", 5000));

        let admission = AdmissionConfig {
            timeout: Duration::from_millis(env_or("ADMISSION_TIMEOUT_MS", 5000)),
            retry: RetryPolicy::new(env_or("ADMISSION_MAX_ATTEMPTS", 3), base_delay, max_delay),
        };

        let notifications = NotificationConfig {
            dispatch_timeout: Duration::from_millis(env_or("DISPATCH_TIMEOUT_MS", 5000)),
            dispatch_retry: RetryPolicy::new(
                env_or("DISPATCH_MAX_ATTEMPTS", 5),
                base_delay,
                max_delay,
            ),
            outbox_poll_interval: Duration::from_secs(env_or("OUTBOX_POLL_SECS", 30)),
            outbox_grace: Duration::from_secs(env_or("OUTBOX_GRACE_SECS", 30)),
            reminder_poll_interval: Duration::from_secs(env_or("REVIEW_REMINDER_POLL_SECS", 3600)),
            reminder_window: chrono::Duration::hours(env_or("REVIEW_REMINDER_WINDOW_HOURS", 72)),
            delivery_poll_interval: Duration::from_secs(env_or("DELIVERY_POLL_SECS", 5)),
            web_push_endpoint: std::env::var("WEB_PUSH_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            admission,
            notifications,
        }
    }
}

/// Read `name` from the environment, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse as `T`.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw).unwrap_or_else(|e| panic!("{e}")),
        Err(_) => default,
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{name} has invalid value '{raw}': {e}"))
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
