#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use reviewhub_api::auth::jwt::JwtConfig;
use reviewhub_api::config::{AdmissionConfig, NotificationConfig, ServerConfig};
use reviewhub_api::router::build_app_router;
use reviewhub_api::state::AppState;
use reviewhub_core::retry::RetryPolicy;
use reviewhub_core::roles::{ROLE_ADMIN, ROLE_USER};
use reviewhub_core::status::CampaignStatus;
use reviewhub_core::types::DbId;
use reviewhub_db::models::campaign::CreateCampaign;
use reviewhub_db::models::user::CreateUser;
use reviewhub_db::repositories::{CampaignRepo, UserRepo};
use reviewhub_events::{EventBus, NotificationRouter, TracingAlertSink};
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and fast retries.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        admission: AdmissionConfig {
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::new(5, Duration::from_millis(5), Duration::from_millis(50)),
        },
        notifications: NotificationConfig::default(),
    }
}

/// Full router plus the bus its handlers publish to.
pub struct TestApp {
    pub router: Router,
    pub bus: Arc<EventBus>,
}

/// Build the application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool).router
}

pub fn build_test_app_with_bus(pool: PgPool) -> TestApp {
    build_test_app_with_config(pool, test_config())
}

pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> TestApp {
    let config = Arc::new(config);
    let bus = Arc::new(EventBus::default());
    let state = AppState::new(pool, Arc::clone(&config), Arc::clone(&bus));
    TestApp {
        router: build_app_router(state, &config),
        bus,
    }
}

/// A notification router with a single attempt per event.
pub fn notification_router(pool: PgPool) -> NotificationRouter {
    NotificationRouter::new(
        pool,
        RetryPolicy::new(1, Duration::ZERO, Duration::ZERO),
        Duration::from_secs(5),
        5,
        Arc::new(TracingAlertSink),
    )
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, name: &str, role: &str) -> DbId {
    UserRepo::upsert(
        pool,
        &CreateUser {
            email: format!("{name}@reviewhub.test"),
            display_name: name.to_string(),
            role: Some(role.to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_member(pool: &PgPool, name: &str) -> (DbId, String) {
    let id = seed_user(pool, name, ROLE_USER).await;
    (id, token(id, ROLE_USER))
}

pub async fn seed_admin(pool: &PgPool) -> (DbId, String) {
    let id = seed_user(pool, "operator", ROLE_ADMIN).await;
    (id, token(id, ROLE_ADMIN))
}

/// An ONGOING, visible campaign whose window contains now.
pub async fn seed_open_campaign(pool: &PgPool, max_participants: i32) -> DbId {
    seed_campaign(pool, max_participants, CampaignStatus::Ongoing, true).await
}

pub async fn seed_campaign(
    pool: &PgPool,
    max_participants: i32,
    status: CampaignStatus,
    is_visible: bool,
) -> DbId {
    let now = Utc::now();
    CampaignRepo::create(
        pool,
        &CreateCampaign {
            title: "Matcha Latte Trial".to_string(),
            max_participants,
            status: Some(status),
            is_visible: Some(is_visible),
            start_date: now - chrono::Duration::days(1),
            end_date: now + chrono::Duration::days(10),
        },
        None,
    )
    .await
    .unwrap()
    .id
}

pub fn token(user_id: DbId, role: &str) -> String {
    test_config().jwt.issue(user_id, role).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn get_anonymous(app: &Router, uri: &str) -> Response<Body> {
    send(app, "GET", uri, None, None).await
}

pub async fn post(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "POST", uri, Some(token), None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "POST", uri, Some(token), Some(body)).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "PATCH", uri, Some(token), Some(body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "PUT", uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "DELETE", uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert an error response's status and machine code.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code, "unexpected error body: {json}");
}
