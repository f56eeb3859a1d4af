//! HTTP-level tests for applying, deciding, reviewing and campaign edits.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{
    assert_error, body_json, get, patch_json, post, post_json, seed_admin, seed_campaign,
    seed_member, seed_open_campaign,
};
use reviewhub_core::channels::ChannelSet;
use reviewhub_core::events::DomainEvent;
use reviewhub_core::notification_type::NotificationType;
use reviewhub_core::retry::RetryPolicy;
use reviewhub_core::roles::ROLE_USER;
use reviewhub_core::status::{ApplicationStatus, CampaignStatus};
use reviewhub_core::types::DbId;
use reviewhub_db::models::notification::PreferenceUpdate;
use reviewhub_db::repositories::NotificationPreferenceRepo;
use reviewhub_events::{DispatchResult, PlatformEvent};
use sqlx::PgPool;
use tokio::sync::broadcast;

fn apply_uri(campaign_id: DbId) -> String {
    format!("/api/v1/campaigns/{campaign_id}/applications")
}

fn status_uri(application_id: DbId) -> String {
    format!("/api/v1/admin/applications/{application_id}/status")
}

async fn counted_applications(pool: &PgPool, campaign_id: DbId) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE campaign_id = $1 AND status_id IN (1, 2)",
    )
    .bind(campaign_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn drain(receiver: &mut broadcast::Receiver<PlatformEvent>) -> Vec<PlatformEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn apply_creates_pending_application(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 5).await;
    let app = common::build_test_app(pool.clone());

    let response = post(&app, &apply_uri(campaign_id), &token).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["data"]["application_id"].is_i64());
    assert_eq!(json["data"]["status"], "PENDING");
    assert_eq!(counted_applications(&pool, campaign_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_apply_is_already_applied(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 5).await;
    let app = common::build_test_app(pool.clone());

    let first = post(&app, &apply_uri(campaign_id), &token).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post(&app, &apply_uri(campaign_id), &token).await;
    assert_error(second, StatusCode::CONFLICT, "ALREADY_APPLIED").await;
    assert_eq!(counted_applications(&pool, campaign_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closed_campaigns_reject_with_not_open(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let pending = seed_campaign(&pool, 5, CampaignStatus::Pending, true).await;
    let completed = seed_campaign(&pool, 5, CampaignStatus::Completed, true).await;
    let hidden = seed_campaign(&pool, 5, CampaignStatus::Ongoing, false).await;
    let app = common::build_test_app(pool);

    for campaign_id in [pending, completed, hidden, 999_999] {
        let response = post(&app, &apply_uri(campaign_id), &token).await;
        assert_error(response, StatusCode::CONFLICT, "CAMPAIGN_NOT_OPEN").await;
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn full_campaign_rejects_with_campaign_full(pool: PgPool) {
    let (_, first) = seed_member(&pool, "hana").await;
    let (_, second) = seed_member(&pool, "jun").await;
    let campaign_id = seed_open_campaign(&pool, 1).await;
    let app = common::build_test_app(pool);

    assert_eq!(post(&app, &apply_uri(campaign_id), &first).await.status(), StatusCode::CREATED);
    let response = post(&app, &apply_uri(campaign_id), &second).await;
    assert_error(response, StatusCode::CONFLICT, "CAMPAIGN_FULL").await;
}

/// Two users race for the last slot: exactly one wins.
#[sqlx::test(migrations = "../../db/migrations")]
async fn racing_for_last_slot_admits_exactly_one(pool: PgPool) {
    let (_, first) = seed_member(&pool, "hana").await;
    let (_, second) = seed_member(&pool, "jun").await;
    let campaign_id = seed_open_campaign(&pool, 1).await;
    let app = common::build_test_app(pool.clone());
    let uri = apply_uri(campaign_id);

    let (a, b) = tokio::join!(post(&app, &uri, &first), post(&app, &uri, &second));

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    let loser = if a.status() == StatusCode::CONFLICT { a } else { b };
    assert_eq!(body_json(loser).await["code"], "CAMPAIGN_FULL");
    assert_eq!(counted_applications(&pool, campaign_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_applicants_never_exceed_capacity(pool: PgPool) {
    let campaign_id = seed_open_campaign(&pool, 3).await;
    let mut tokens = Vec::new();
    for i in 0..10 {
        tokens.push(seed_member(&pool, &format!("applicant{i}")).await.1);
    }
    let app = common::build_test_app(pool.clone());
    let uri = apply_uri(campaign_id);

    let handles: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move { post(&app, &uri, &token).await.status() })
        })
        .collect();
    let statuses: Vec<StatusCode> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 3);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 7);
    assert_eq!(counted_applications(&pool, campaign_id).await, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn apply_requires_a_token(pool: PgPool) {
    let campaign_id = seed_open_campaign(&pool, 1).await;
    let app = common::build_test_app(pool);

    let response = common::get_anonymous(&app, &format!("/api/v1/campaigns/{campaign_id}")).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let response = post(&app, &apply_uri(campaign_id), "not-a-jwt").await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

/// A well-signed token whose subject was never mirrored into `users`.
#[sqlx::test(migrations = "../../db/migrations")]
async fn token_for_unknown_account_is_unauthorized(pool: PgPool) {
    let campaign_id = seed_open_campaign(&pool, 5).await;
    let stranger = common::token(424_242, ROLE_USER);
    let app = common::build_test_app(pool.clone());

    let response = post(&app, &apply_uri(campaign_id), &stranger).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let response = common::put_json(
        &app,
        "/api/v1/notifications/preferences",
        &stranger,
        serde_json::json!([{ "notification_type": "MARKETING", "channels": [], "is_enabled": false }]),
    )
    .await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

/// While another transaction holds the campaign lock every attempt hits the
/// deadline: the caller gets a retryable 503 and nothing is written.
#[sqlx::test(migrations = "../../db/migrations")]
async fn apply_past_deadline_rolls_back_as_transient(pool: PgPool) {
    let (_, token) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 5).await;

    let mut config = common::test_config();
    config.admission.timeout = Duration::from_millis(200);
    config.admission.retry =
        RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(10));
    let app = common::build_test_app_with_config(pool.clone(), config).router;

    let mut blocker = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM campaigns WHERE id = $1 FOR UPDATE")
        .bind(campaign_id)
        .execute(&mut *blocker)
        .await
        .unwrap();

    let response = post(&app, &apply_uri(campaign_id), &token).await;
    assert_error(response, StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_STORE_FAILURE").await;

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE campaign_id = $1")
        .bind(campaign_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
    let outbox: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domain_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(outbox, 0);

    blocker.rollback().await.unwrap();

    // Once the lock is released the same request is admitted.
    let response = post(&app, &apply_uri(campaign_id), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(counted_applications(&pool, campaign_id).await, 1);
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

async fn apply_as(app: &axum::Router, campaign_id: DbId, token: &str) -> DbId {
    let response = post(app, &apply_uri(campaign_id), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["application_id"]
        .as_i64()
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejection_releases_the_slot(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, first) = seed_member(&pool, "hana").await;
    let (_, second) = seed_member(&pool, "jun").await;
    let campaign_id = seed_open_campaign(&pool, 1).await;
    let app = common::build_test_app(pool);

    let application_id = apply_as(&app, campaign_id, &first).await;
    let full = post(&app, &apply_uri(campaign_id), &second).await;
    assert_error(full, StatusCode::CONFLICT, "CAMPAIGN_FULL").await;

    let response = patch_json(
        &app,
        &status_uri(application_id),
        &admin,
        serde_json::json!({ "status": "REJECTED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "REJECTED");

    apply_as(&app, campaign_id, &second).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn decided_applications_are_terminal(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, member) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 2).await;
    let app = common::build_test_app(pool.clone());
    let application_id = apply_as(&app, campaign_id, &member).await;

    let accept = serde_json::json!({ "status": "ACCEPTED" });
    let response = patch_json(&app, &status_uri(application_id), &admin, accept.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    for next in ["REJECTED", "PENDING", "ACCEPTED"] {
        let response = patch_json(
            &app,
            &status_uri(application_id),
            &admin,
            serde_json::json!({ "status": next }),
        )
        .await;
        assert_error(response, StatusCode::CONFLICT, "INVALID_TRANSITION").await;
    }

    let status_id: i16 = sqlx::query_scalar("SELECT status_id FROM applications WHERE id = $1")
        .bind(application_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status_id, ApplicationStatus::Accepted.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_admins_decide(pool: PgPool) {
    let (_, member) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 2).await;
    let app = common::build_test_app(pool);
    let application_id = apply_as(&app, campaign_id, &member).await;

    let response = patch_json(
        &app,
        &status_uri(application_id),
        &member,
        serde_json::json!({ "status": "ACCEPTED" }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deciding_unknown_application_is_not_found(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = patch_json(
        &app,
        &status_uri(424_242),
        &admin,
        serde_json::json!({ "status": "ACCEPTED" }),
    )
    .await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

// ---------------------------------------------------------------------------
// Notifications from decisions
// ---------------------------------------------------------------------------

/// Apply, accept, then route the published events: the member ends up with
/// an "accepted" notification and one queued log per enabled channel.
#[sqlx::test(migrations = "../../db/migrations")]
async fn acceptance_produces_one_notification_with_logs(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (member_id, member) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 2).await;
    let test_app = common::build_test_app_with_bus(pool.clone());
    let app = &test_app.router;
    let mut receiver = test_app.bus.subscribe();
    let router = common::notification_router(pool.clone());

    let application_id = apply_as(app, campaign_id, &member).await;
    let response = patch_json(
        app,
        &status_uri(application_id),
        &admin,
        serde_json::json!({ "status": "ACCEPTED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let events = drain(&mut receiver);
    assert_eq!(events.len(), 2);
    assert_matches!(events[0].event, DomainEvent::ApplicationCreated { .. });
    assert_matches!(
        events[1].event,
        DomainEvent::ApplicationStatusChanged {
            to: ApplicationStatus::Accepted,
            ..
        }
    );
    for event in &events {
        assert!(event.outbox_id.is_some());
        assert_matches!(router.handle(event).await, Some(DispatchResult::Queued { .. }));
    }
    // Redelivery of the same event is harmless.
    assert_matches!(
        router.handle(&events[1]).await,
        Some(DispatchResult::Duplicate { .. })
    );

    let response = get(app, "/api/v1/notifications", &member).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    let newest = &json["data"][0];
    assert_eq!(newest["notification_type"], "APPLICATION_STATUS");
    assert_eq!(newest["title"], "Application accepted");
    assert!(newest["content"].as_str().unwrap().contains("accepted"));

    let logs: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notification_logs l \
         JOIN notifications n ON n.id = l.notification_id \
         WHERE n.user_id = $1 AND n.title = 'Application accepted'",
    )
    .bind(member_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(logs, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disabled_application_status_is_suppressed(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (member_id, member) = seed_member(&pool, "hana").await;
    let campaign_id = seed_open_campaign(&pool, 2).await;
    NotificationPreferenceRepo::replace(
        &pool,
        member_id,
        &[PreferenceUpdate {
            notification_type: NotificationType::ApplicationStatus,
            channels: ChannelSet::all(),
            is_enabled: false,
        }],
    )
    .await
    .unwrap();

    let test_app = common::build_test_app_with_bus(pool.clone());
    let app = &test_app.router;
    let mut receiver = test_app.bus.subscribe();
    let router = common::notification_router(pool.clone());

    let application_id = apply_as(app, campaign_id, &member).await;
    patch_json(
        app,
        &status_uri(application_id),
        &admin,
        serde_json::json!({ "status": "ACCEPTED" }),
    )
    .await;

    for event in drain(&mut receiver) {
        assert_eq!(router.handle(&event).await, Some(DispatchResult::Suppressed));
    }

    let json = body_json(get(app, "/api/v1/notifications", &member).await).await;
    assert_eq!(json["total"], 0);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_only_for_own_accepted_application_once(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, owner) = seed_member(&pool, "hana").await;
    let (_, stranger) = seed_member(&pool, "jun").await;
    let campaign_id = seed_open_campaign(&pool, 2).await;
    let app = common::build_test_app(pool);
    let application_id = apply_as(&app, campaign_id, &owner).await;
    let uri = format!("/api/v1/applications/{application_id}/review");
    let body = serde_json::json!({ "content": "Smooth and not too sweet." });

    let response = post_json(&app, &uri, &owner, body.clone()).await;
    assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;

    patch_json(
        &app,
        &status_uri(application_id),
        &admin,
        serde_json::json!({ "status": "ACCEPTED" }),
    )
    .await;

    let response = post_json(&app, &uri, &stranger, body.clone()).await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let response = post_json(&app, &uri, &owner, serde_json::json!({ "content": "  " })).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;

    let response = post_json(&app, &uri, &owner, body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["application_id"], application_id);
    assert_eq!(json["data"]["content"], "Smooth and not too sweet.");

    let response = post_json(&app, &uri, &owner, body).await;
    assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;
}

// ---------------------------------------------------------------------------
// Campaign administration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_creates_campaign_and_reads_capacity(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, member) = seed_member(&pool, "hana").await;
    let app = common::build_test_app(pool);
    let now = chrono::Utc::now();

    let response = post_json(
        &app,
        "/api/v1/admin/campaigns",
        &admin,
        serde_json::json!({
            "title": "Oat Milk Sampling",
            "max_participants": 2,
            "status": "ONGOING",
            "start_date": now - chrono::Duration::hours(1),
            "end_date": now + chrono::Duration::days(3),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let campaign_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    apply_as(&app, campaign_id, &member).await;

    let json = body_json(
        get(&app, &format!("/api/v1/campaigns/{campaign_id}/capacity"), &member).await,
    )
    .await;
    assert_eq!(json["data"]["max_participants"], 2);
    assert_eq!(json["data"]["reserved"], 1);
    assert_eq!(json["data"]["remaining"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hidden_campaign_capacity_is_admin_only(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, member) = seed_member(&pool, "hana").await;
    let campaign_id = seed_campaign(&pool, 4, CampaignStatus::Ongoing, false).await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/campaigns/{campaign_id}/capacity");

    assert_error(get(&app, &uri, &member).await, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let response = get(&app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["remaining"], 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_campaign_validates_input(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, member) = seed_member(&pool, "hana").await;
    let app = common::build_test_app(pool);
    let now = chrono::Utc::now();
    let body = |max: i32, end: chrono::DateTime<chrono::Utc>| {
        serde_json::json!({
            "title": "Oat Milk Sampling",
            "max_participants": max,
            "start_date": now,
            "end_date": end,
        })
    };

    let response = post_json(&app, "/api/v1/admin/campaigns", &member, body(2, now)).await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let response = post_json(&app, "/api/v1/admin/campaigns", &admin, body(0, now)).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;

    let earlier = now - chrono::Duration::days(1);
    let response = post_json(&app, "/api/v1/admin/campaigns", &admin, body(2, earlier)).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn capacity_cannot_drop_below_reservations(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, first) = seed_member(&pool, "hana").await;
    let (_, second) = seed_member(&pool, "jun").await;
    let campaign_id = seed_open_campaign(&pool, 3).await;
    let app = common::build_test_app(pool);
    apply_as(&app, campaign_id, &first).await;
    apply_as(&app, campaign_id, &second).await;
    let uri = format!("/api/v1/admin/campaigns/{campaign_id}");

    let response = patch_json(&app, &uri, &admin, serde_json::json!({ "max_participants": 1 })).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;

    let response = patch_json(&app, &uri, &admin, serde_json::json!({ "max_participants": 2 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["max_participants"], 2);
    assert_eq!(json["data"]["revision"], 2);
}

/// Completing a campaign closes admission, rejects whatever is still pending,
/// and tells remaining participants about the change.
#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_campaign_rejects_pending_and_closes_admission(pool: PgPool) {
    let (_, admin) = seed_admin(&pool).await;
    let (_, accepted) = seed_member(&pool, "hana").await;
    let (_, pending) = seed_member(&pool, "jun").await;
    let (_, latecomer) = seed_member(&pool, "min").await;
    let campaign_id = seed_open_campaign(&pool, 5).await;
    let test_app = common::build_test_app_with_bus(pool.clone());
    let app = &test_app.router;

    let accepted_id = apply_as(app, campaign_id, &accepted).await;
    let pending_id = apply_as(app, campaign_id, &pending).await;
    patch_json(
        app,
        &status_uri(accepted_id),
        &admin,
        serde_json::json!({ "status": "ACCEPTED" }),
    )
    .await;

    let mut receiver = test_app.bus.subscribe();
    let response = patch_json(
        app,
        &format!("/api/v1/admin/campaigns/{campaign_id}"),
        &admin,
        serde_json::json!({ "status": "COMPLETED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let events = drain(&mut receiver);
    assert_eq!(events.len(), 2);
    assert_matches!(
        &events[0].event,
        DomainEvent::ApplicationStatusChanged { application_id, to: ApplicationStatus::Rejected, .. }
            if *application_id == pending_id
    );
    assert_matches!(
        &events[1].event,
        DomainEvent::CampaignUpdated { status: CampaignStatus::Completed, revision: 2, .. }
    );

    let mine = body_json(get(app, "/api/v1/applications", &pending).await).await;
    assert_eq!(mine["data"][0]["status"], "REJECTED");

    let response = post(app, &apply_uri(campaign_id), &latecomer).await;
    assert_error(response, StatusCode::CONFLICT, "CAMPAIGN_NOT_OPEN").await;

    let response = patch_json(
        app,
        &format!("/api/v1/admin/campaigns/{campaign_id}"),
        &admin,
        serde_json::json!({ "status": "ONGOING" }),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "INVALID_TRANSITION").await;
}
