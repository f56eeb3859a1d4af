//! HTTP error mapping.
//!
//! Every failure leaves the server as `{ "error": <message>, "code": <CODE> }`.
//! Admission outcomes get their own codes so clients can tell "you already
//! applied" from "the campaign is full" without parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reviewhub_core::error::CoreError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Wire form of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    code: &'static str,
}

impl ErrorBody {
    fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code,
        }
    }

    /// 500 with the detail kept in the log, not the body.
    fn internal(detail: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Request failed with an internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    /// 503 telling the client a retry may succeed.
    fn transient(detail: &dyn std::fmt::Display) -> Self {
        tracing::warn!(error = %detail, "Request failed on a transient store error");
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "TRANSIENT_STORE_FAILURE",
            "The request could not be completed right now, please retry",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Core(err) => from_core(err),
            AppError::Database(err) => from_sqlx(err),
            AppError::BadRequest(msg) => ErrorBody::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Internal(msg) => ErrorBody::internal(msg),
        };
        (body.status, Json(body)).into_response()
    }
}

fn from_core(err: &CoreError) -> ErrorBody {
    let conflict = |code| ErrorBody::new(StatusCode::CONFLICT, code, err.to_string());
    match err {
        CoreError::NotFound { entity, id } => ErrorBody::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            ErrorBody::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
        }
        CoreError::Unauthorized(msg) => ErrorBody::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
        CoreError::Forbidden(msg) => ErrorBody::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        CoreError::Conflict(msg) => ErrorBody::new(StatusCode::CONFLICT, "CONFLICT", msg),
        CoreError::CampaignNotOpen { .. } => conflict("CAMPAIGN_NOT_OPEN"),
        CoreError::AlreadyApplied { .. } => conflict("ALREADY_APPLIED"),
        CoreError::CampaignFull { .. } => conflict("CAMPAIGN_FULL"),
        CoreError::InvalidTransition { .. } => conflict("INVALID_TRANSITION"),
        CoreError::TransientStoreFailure(detail) => ErrorBody::transient(detail),
        CoreError::Internal(detail) => ErrorBody::internal(detail),
    }
}

/// Map a store error that escaped a handler.
///
/// Transient failures (serialization, deadlock, lock or statement timeout,
/// pool exhaustion, I/O) become 503, `RowNotFound` 404, and a unique
/// violation on a `uq_*` constraint 409. Anything else is a 500.
fn from_sqlx(err: &sqlx::Error) -> ErrorBody {
    if reviewhub_db::is_transient(err) {
        return ErrorBody::transient(err);
    }
    if let sqlx::Error::RowNotFound = err {
        return ErrorBody::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found");
    }
    if let Some(constraint) = unique_constraint(err).filter(|c| c.starts_with("uq_")) {
        return ErrorBody::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        );
    }
    ErrorBody::internal(err)
}

fn unique_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            db_err.constraint()
        }
        _ => None,
    }
}
