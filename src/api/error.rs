//! API error type and JSON error responses
//!
//! Every failure is rendered as `{"error": <code>, "message": <text>}`.

use crate::error::CajaError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "bad_request", "not_found")
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400: malformed or missing request fields
    BadRequest(String),
    /// 404: unknown session
    NotFound(String),
    /// 500: anything else
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<CajaError>() {
            Some(CajaError::SessionNotFound(_)) => ApiError::NotFound("Session not found".to_string()),
            Some(CajaError::Config(msg)) => ApiError::BadRequest(msg.clone()),
            _ => {
                tracing::error!("Request failed: {:#}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}
