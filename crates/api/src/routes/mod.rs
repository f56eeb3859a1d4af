pub mod admin;
pub mod application;
pub mod campaign;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /campaigns/{id}                          get
/// /campaigns/{id}/capacity                 live capacity snapshot
/// /campaigns/{id}/applications             apply (POST)
///
/// /applications                            caller's applications
/// /applications/{id}/review                submit review (POST)
///
/// /admin/campaigns                         create (POST, admin only)
/// /admin/campaigns/{id}                    edit (PATCH, admin only)
/// /admin/applications/{id}/status          decide (PATCH, admin only)
///
/// /notifications                           list
/// /notifications/unread-count              unread count
/// /notifications/read-all                  mark all read (POST)
/// /notifications/{id}                      delete
/// /notifications/{id}/read                 mark read (POST)
/// /notifications/preferences               get, replace (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/campaigns", campaign::router())
        .nest("/applications", application::router())
        .nest("/admin", admin::router())
        .nest("/notifications", notification::router())
}
