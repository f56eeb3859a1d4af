//! Admin gate for the `/admin` routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use reviewhub_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An [`AuthUser`] whose role is `admin`; anyone else gets 403.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await? {
            user if user.is_admin() => Ok(RequireAdmin(user)),
            user => {
                tracing::debug!(user_id = user.user_id, role = %user.role, "Admin route refused");
                Err(CoreError::Forbidden("Admin role required".into()).into())
            }
        }
    }
}
