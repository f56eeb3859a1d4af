//! Route definitions under `/admin`. Every handler requires the admin role.

use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::{application, campaign};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /campaigns                  -> create_campaign
/// PATCH  /campaigns/{id}             -> update_campaign
/// PATCH  /applications/{id}/status   -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/campaigns", post(campaign::create_campaign))
        .route("/campaigns/{id}", patch(campaign::update_campaign))
        .route("/applications/{id}/status", patch(application::update_status))
}
