//! Route definitions for the `/applications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// GET    /                -> list_mine
/// POST   /{id}/review     -> submit_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(application::list_mine))
        .route("/{id}/review", post(application::submit_review))
}
