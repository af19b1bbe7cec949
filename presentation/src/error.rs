//! HTTP mapping of relay failures.
//!
//! Error bodies are `{"detail": "..."}`. Internal failures are logged in full
//! and reach the caller only as a generic detail.

use application::error::RelayError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const MISSING_USER_MESSAGE_DETAIL: &str = "Сообщение пользователя не найдено";
pub const UPSTREAM_FAILURE_DETAIL: &str = "Ошибка при запросе к Ollama";
pub const INTERNAL_ERROR_DETAIL: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The generation service answered with a non-success status.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_DETAIL.to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::MissingUserMessage => {
                ApiError::BadRequest(MISSING_USER_MESSAGE_DETAIL.to_string())
            }
            RelayError::UpstreamStatus { status } => {
                error!(status, "generation service returned a non-success status");
                ApiError::Upstream(UPSTREAM_FAILURE_DETAIL.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
