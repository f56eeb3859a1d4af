//! Handlers for campaign reads and administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reviewhub_core::error::CoreError;
use reviewhub_core::types::DbId;
use reviewhub_db::models::campaign::{Campaign, CapacitySnapshot, CreateCampaign, UpdateCampaign};
use reviewhub_db::repositories::{CampaignRepo, CapacityLedger};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Campaign",
        id,
    })
}

/// GET /api/v1/campaigns/{id}
///
/// Hidden campaigns are only visible to admins.
pub async fn get_campaign(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = CampaignRepo::find_by_id(&state.pool, campaign_id)
        .await?
        .filter(|c| c.is_visible || auth.is_admin())
        .ok_or_else(|| not_found(campaign_id))?;
    Ok(Json(DataResponse { data: campaign }))
}

/// GET /api/v1/campaigns/{id}/capacity
///
/// Live `{max_participants, reserved, remaining}` figures, read without locking.
/// Hidden campaigns are 404 for everyone but admins, as in [`get_campaign`].
pub async fn get_capacity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<DataResponse<CapacitySnapshot>>> {
    if !auth.is_admin() {
        CampaignRepo::find_by_id(&state.pool, campaign_id)
            .await?
            .filter(|c| c.is_visible)
            .ok_or_else(|| not_found(campaign_id))?;
    }
    let snapshot = CapacityLedger::snapshot(&state.pool, campaign_id)
        .await?
        .ok_or_else(|| not_found(campaign_id))?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /api/v1/admin/campaigns
pub async fn create_campaign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<DataResponse<Campaign>>)> {
    let campaign = state
        .admission
        .create_campaign(&input, admin.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

/// PATCH /api/v1/admin/campaigns/{id}
pub async fn update_campaign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    Json(input): Json<UpdateCampaign>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = state
        .admission
        .update_campaign(campaign_id, &input, admin.user_id)
        .await?;
    Ok(Json(DataResponse { data: campaign }))
}
