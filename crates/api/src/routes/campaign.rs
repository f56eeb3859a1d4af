//! Route definitions for the `/campaigns` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{application, campaign};
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /{id}                 -> get_campaign
/// GET    /{id}/capacity        -> get_capacity
/// POST   /{id}/applications    -> apply
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(campaign::get_campaign))
        .route("/{id}/capacity", get(campaign::get_capacity))
        .route("/{id}/applications", post(application::apply))
}
