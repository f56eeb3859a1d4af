use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reviewhub_api::config::{NotificationConfig, ServerConfig};
use reviewhub_api::router::build_app_router;
use reviewhub_api::state::AppState;
use reviewhub_events::{
    AlertSink, DeliveryWorker, DeliveryWorkerConfig, EmailConfig, EmailSender, EventBus,
    InAppSender, NotificationRouter, OutboxRelay, OutboxRelayConfig, ReviewReminderScheduler,
    TracingAlertSink, WebPushSender,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reviewhub_api=debug,reviewhub_events=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = reviewhub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    reviewhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    reviewhub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event services ---
    let event_bus = Arc::new(EventBus::default());
    let alerts: Arc<dyn AlertSink> = Arc::new(TracingAlertSink);
    let notifications = &config.notifications;

    let notification_router = NotificationRouter::new(
        pool.clone(),
        notifications.dispatch_retry,
        notifications.dispatch_timeout,
        notifications.dispatch_retry.max_attempts,
        Arc::clone(&alerts),
    );
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));

    let cancel = CancellationToken::new();

    let relay = OutboxRelay::new(
        pool.clone(),
        OutboxRelayConfig {
            poll_interval: notifications.outbox_poll_interval,
            grace: notifications.outbox_grace,
            max_attempts: notifications.dispatch_retry.max_attempts,
            dispatch_timeout: notifications.dispatch_timeout,
            ..OutboxRelayConfig::default()
        },
        alerts,
    );
    let relay_cancel = cancel.clone();
    let relay_handle = tokio::spawn(async move { relay.run(relay_cancel).await });

    let reminders = ReviewReminderScheduler::new(
        pool.clone(),
        Arc::clone(&event_bus),
        notifications.reminder_poll_interval,
        notifications.reminder_window,
    );
    let reminder_cancel = cancel.clone();
    let reminder_handle = tokio::spawn(async move { reminders.run(reminder_cancel).await });

    let worker = build_delivery_worker(pool.clone(), notifications);
    let worker_cancel = cancel.clone();
    let worker_handle = tokio::spawn(async move { worker.run(worker_cancel).await });

    tracing::info!("Event services started (router, outbox relay, reminders, delivery)");

    // --- App state ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let config = Arc::new(config);
    let state = AppState::new(pool, Arc::clone(&config), Arc::clone(&event_bus));
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    drain("outbox relay", relay_handle, shutdown_timeout).await;
    drain("review reminders", reminder_handle, shutdown_timeout).await;
    drain("delivery worker", worker_handle, shutdown_timeout).await;

    // Last sender gone closes the broadcast channel and stops the router.
    drop(event_bus);
    drain("notification router", router_handle, shutdown_timeout).await;

    tracing::info!("Graceful shutdown complete");
}

/// Register a sender for every channel that is configured.
fn build_delivery_worker(pool: reviewhub_db::DbPool, config: &NotificationConfig) -> DeliveryWorker {
    let mut worker = DeliveryWorker::new(
        pool,
        DeliveryWorkerConfig {
            poll_interval: config.delivery_poll_interval,
            ..DeliveryWorkerConfig::default()
        },
    )
    .with_sender(Arc::new(InAppSender));

    match EmailConfig::from_env().map(EmailSender::new) {
        Some(Ok(sender)) => worker = worker.with_sender(Arc::new(sender)),
        Some(Err(e)) => tracing::error!(error = %e, "Email sender misconfigured, email disabled"),
        None => tracing::info!("SMTP_HOST not set, email delivery disabled"),
    }

    match &config.web_push_endpoint {
        Some(endpoint) => match WebPushSender::new(endpoint.as_str()) {
            Ok(sender) => worker = worker.with_sender(Arc::new(sender)),
            Err(e) => tracing::error!(error = %e, "Web push sender failed to build, web push disabled"),
        },
        None => tracing::info!("WEB_PUSH_ENDPOINT not set, web push delivery disabled"),
    }

    worker
}

/// Wait for a background task, giving up after `timeout`.
async fn drain(name: &'static str, handle: JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => tracing::info!(task = name, "Background task stopped"),
        Ok(Err(e)) => tracing::error!(task = name, error = %e, "Background task panicked"),
        Err(_) => tracing::warn!(task = name, "Background task did not stop in time"),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
