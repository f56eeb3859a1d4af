//! HTTP-level tests for the notification feed and preference endpoints.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{assert_error, body_json, delete, get, post, put_json, seed_member};
use reviewhub_core::events::DomainEvent;
use reviewhub_core::types::DbId;
use reviewhub_events::{DispatchResult, NotificationDispatcher};
use sqlx::PgPool;

/// Dispatch `count` payment notifications for `user_id`, returning their ids
/// oldest first.
async fn seed_notifications(pool: &PgPool, user_id: DbId, count: usize) -> Vec<DbId> {
    let dispatcher = NotificationDispatcher::new(pool.clone());
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let event = DomainEvent::PaymentSettled {
            payment_ref: format!("pay-{user_id}-{i}"),
            user_id,
            amount_cents: 1250,
            currency: "USD".to_string(),
            succeeded: true,
        };
        let result = dispatcher.dispatch(&event).await.unwrap();
        let id = assert_matches!(result, DispatchResult::Queued { notification_id, .. } => notification_id);
        ids.push(id);
    }
    ids
}

async fn unread(app: &axum::Router, token: &str) -> i64 {
    let json = body_json(get(app, "/api/v1/notifications/unread-count", token).await).await;
    json["data"]["count"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_is_paged_newest_first(pool: PgPool) {
    let (user_id, token) = seed_member(&pool, "hana").await;
    let ids = seed_notifications(&pool, user_id, 5).await;
    let app = common::build_test_app(pool);

    let response = get(&app, "/api/v1/notifications?page=1&limit=2", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 5);
    assert_eq!(json["page"], 1);
    assert_eq!(json["limit"], 2);
    let page: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();
    assert_eq!(page, vec![ids[4], ids[3]]);
    assert_eq!(json["data"][0]["title"], "Payment completed");
    assert_eq!(json["data"][0]["notification_type"], "PAYMENT_STATUS");
    assert!(json["data"][0].get("idempotency_key").is_none());

    let json = body_json(get(&app, "/api/v1/notifications?page=3&limit=2", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], ids[0]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_only_shows_own_notifications(pool: PgPool) {
    let (hana, hana_token) = seed_member(&pool, "hana").await;
    let (jun, _) = seed_member(&pool, "jun").await;
    seed_notifications(&pool, hana, 1).await;
    seed_notifications(&pool, jun, 3).await;
    let app = common::build_test_app(pool);

    let json = body_json(get(&app, "/api/v1/notifications", &hana_token).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["user_id"], hana);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn read_flags_drive_unread_count(pool: PgPool) {
    let (user_id, token) = seed_member(&pool, "hana").await;
    let ids = seed_notifications(&pool, user_id, 3).await;
    let app = common::build_test_app(pool);
    assert_eq!(unread(&app, &token).await, 3);

    let response = post(&app, &format!("/api/v1/notifications/{}/read", ids[0]), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(unread(&app, &token).await, 2);

    let json = body_json(get(&app, "/api/v1/notifications?unread_only=true", &token).await).await;
    assert_eq!(json["total"], 2);
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|n| n["is_read"] == false));

    let response = post(&app, "/api/v1/notifications/read-all", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["marked_read"], 2);
    assert_eq!(unread(&app, &token).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn other_users_notifications_are_not_found(pool: PgPool) {
    let (hana, _) = seed_member(&pool, "hana").await;
    let (_, jun_token) = seed_member(&pool, "jun").await;
    let ids = seed_notifications(&pool, hana, 1).await;
    let app = common::build_test_app(pool);

    let response = post(&app, &format!("/api/v1/notifications/{}/read", ids[0]), &jun_token).await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let response = delete(&app, &format!("/api/v1/notifications/{}", ids[0]), &jun_token).await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_notification(pool: PgPool) {
    let (user_id, token) = seed_member(&pool, "hana").await;
    let ids = seed_notifications(&pool, user_id, 2).await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/notifications/{}", ids[1]);

    assert_eq!(delete(&app, &uri, &token).await.status(), StatusCode::NO_CONTENT);
    assert_error(delete(&app, &uri, &token).await, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let json = body_json(get(&app, "/api/v1/notifications", &token).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["id"], ids[0]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn feed_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::get_anonymous(&app, "/api/v1/notifications").await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn preferences_default_to_everything_enabled(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let app = common::build_test_app(pool);

    let json = body_json(get(&app, "/api/v1/notifications/preferences", &token).await).await;
    let prefs = json["data"].as_array().unwrap();
    assert_eq!(prefs.len(), 7);
    for pref in prefs {
        assert_eq!(pref["is_enabled"], true);
        assert_eq!(pref["channels"].as_array().unwrap().len(), 4);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn put_replaces_listed_types_only(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let app = common::build_test_app(pool);

    let response = put_json(
        &app,
        "/api/v1/notifications/preferences",
        &token,
        serde_json::json!([
            { "notification_type": "MARKETING", "channels": [], "is_enabled": false },
            { "notification_type": "REVIEW_REMINDER", "channels": ["email"], "is_enabled": true },
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["updated"], 2);

    let json = body_json(get(&app, "/api/v1/notifications/preferences", &token).await).await;
    let prefs = json["data"].as_array().unwrap();
    assert_eq!(prefs.len(), 7);
    let find = |kind: &str| {
        prefs
            .iter()
            .find(|p| p["notification_type"] == kind)
            .unwrap()
            .clone()
    };
    assert_eq!(find("MARKETING")["is_enabled"], false);
    assert_eq!(find("REVIEW_REMINDER")["channels"], serde_json::json!(["email"]));
    assert_eq!(find("PAYMENT_STATUS")["is_enabled"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn put_rejects_bad_bodies(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let app = common::build_test_app(pool);
    let uri = "/api/v1/notifications/preferences";

    let response = put_json(&app, uri, &token, serde_json::json!([])).await;
    assert_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;

    let entry = serde_json::json!({ "notification_type": "MARKETING", "channels": [], "is_enabled": false });
    let response = put_json(&app, uri, &token, serde_json::json!([entry.clone(), entry])).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;

    let response = put_json(
        &app,
        uri,
        &token,
        serde_json::json!([{ "notification_type": "NEWSLETTER", "channels": [], "is_enabled": true }]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
