use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use app::error::AppError;

/// Transport wrapper for domain errors. Every error body is `{"error": ...}`
/// so callers can surface the message verbatim; transient judge trouble maps
/// to a retryable status instead of a client mistake.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::TournamentNotFound | AppError::MatchNotFound => StatusCode::NOT_FOUND,
            AppError::TournamentFull
            | AppError::InvalidHandle(_)
            | AppError::MatchNotStartable(_) => StatusCode::BAD_REQUEST,
            AppError::Oracle(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
