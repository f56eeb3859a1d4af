//! Handlers for applying to campaigns, deciding applications, and reviews.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reviewhub_core::status::ApplicationStatus;
use reviewhub_core::types::DbId;
use reviewhub_db::models::application::{
    ApplicationView, CreateReview, Review, UpdateApplicationStatus,
};
use reviewhub_db::repositories::ApplicationRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a successful `POST /campaigns/{id}/applications`.
#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub application_id: DbId,
    pub status: ApplicationStatus,
}

/// POST /api/v1/campaigns/{id}/applications
///
/// Apply the authenticated user to the campaign. Returns 201 with the new
/// application id, or 409 with `CAMPAIGN_NOT_OPEN`, `ALREADY_APPLIED` or
/// `CAMPAIGN_FULL`.
pub async fn apply(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<AdmissionResponse>>)> {
    let application = state.admission.apply(auth.user_id, campaign_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AdmissionResponse {
                application_id: application.id,
                status: application.status()?,
            },
        }),
    ))
}

/// GET /api/v1/applications
///
/// The authenticated user's applications, newest first.
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ApplicationView>>>> {
    let applications = ApplicationRepo::list_for_user(&state.pool, auth.user_id).await?;
    let data = applications
        .iter()
        .map(|a| a.view())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/applications/{id}/review
pub async fn submit_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(application_id): Path<DbId>,
    Json(input): Json<CreateReview>,
) -> AppResult<(StatusCode, Json<DataResponse<Review>>)> {
    let review = state
        .admission
        .submit_review(auth.user_id, application_id, &input.content)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: review })))
}

/// PATCH /api/v1/admin/applications/{id}/status
///
/// Decide a pending application. Terminal applications answer 409
/// `INVALID_TRANSITION` and stay unchanged.
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(application_id): Path<DbId>,
    Json(input): Json<UpdateApplicationStatus>,
) -> AppResult<Json<DataResponse<ApplicationView>>> {
    let application = state
        .admission
        .transition(application_id, input.status, admin.user_id)
        .await?;
    Ok(Json(DataResponse {
        data: application.view()?,
    }))
}
