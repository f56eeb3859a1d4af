//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`] and only ever touch
//! the caller's own rows.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reviewhub_core::error::CoreError;
use reviewhub_core::types::DbId;
use reviewhub_db::models::notification::{
    Notification, NotificationPreference, PreferenceUpdate,
};
use reviewhub_db::repositories::{NotificationPreferenceRepo, NotificationRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PageParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// If `true`, return only unread notifications.
    #[serde(default)]
    pub unread_only: bool,
}

impl NotificationQuery {
    fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Notification",
        id,
    })
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// Newest first; expired notifications are omitted.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<PageResponse<Notification>>> {
    let paging = params.paging();
    let limit = paging.limit();
    let (data, total) = futures::try_join!(
        NotificationRepo::list_for_user(
            &state.pool,
            auth.user_id,
            params.unread_only,
            limit,
            paging.offset(),
        ),
        NotificationRepo::count_for_user(&state.pool, auth.user_id, params.unread_only),
    )?;

    Ok(Json(PageResponse {
        data,
        page: paging.page(),
        limit,
        total,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "data": { "count": count } })))
}

/// POST /api/v1/notifications/{id}/read
///
/// 204 on success, 404 if the notification is not the caller's.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await? {
        return Err(not_found(notification_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "data": { "marked_read": count } })))
}

/// DELETE /api/v1/notifications/{id}
pub async fn delete_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !NotificationRepo::delete(&state.pool, notification_id, auth.user_id).await? {
        return Err(not_found(notification_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/preferences
///
/// One entry per notification type; types the user never touched are
/// materialized with every channel enabled.
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<NotificationPreference>>>> {
    let prefs = NotificationPreferenceRepo::list_resolved(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: prefs }))
}

/// PUT /api/v1/notifications/preferences
///
/// Replaces the listed types in one transaction; either all entries apply
/// or none do. Types not listed keep their current setting.
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(updates): Json<Vec<PreferenceUpdate>>,
) -> AppResult<Json<serde_json::Value>> {
    if updates.is_empty() {
        return Err(AppError::BadRequest(
            "At least one preference entry is required".into(),
        ));
    }
    let mut seen = std::collections::BTreeSet::new();
    if let Some(dup) = updates.iter().find(|u| !seen.insert(u.notification_type)) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Notification type {} listed more than once",
            dup.notification_type
        ))));
    }

    let updated = NotificationPreferenceRepo::replace(&state.pool, auth.user_id, &updates).await?;
    tracing::info!(
        user_id = auth.user_id,
        count = updated.len(),
        "Notification preferences updated"
    );

    Ok(Json(serde_json::json!({
        "data": { "updated": updated.len() }
    })))
}
