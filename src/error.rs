// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 500 Internal Server Error
    #[error("internal server error: {0}")]
    InternalServerError(String),

    // 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(String),

    // 404 Not Found
    #[error("not found: {0}")]
    NotFound(String),
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// A misapplied sanitization marker is a programming error: the request fails
/// with a 500 and the details only reach the log.
impl From<SanitizeError> for AppError {
    fn from(err: SanitizeError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Configuration errors of the sanitization pipeline.
///
/// Only misconfiguration ends up here. A value that is not eligible or a tag
/// dropped by the allow-list is the normal path and never produces an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// The marker was put on a field that is not string-typed.
    #[error("field `{model}.{field}` is marked for HTML sanitization but is not a string")]
    MarkerOnNonText {
        model: &'static str,
        field: &'static str,
    },

    /// The schema declares a property the payload type cannot hand out.
    #[error("property `{model}.{field}` is declared in the schema but could not be resolved")]
    UnresolvedProperty {
        model: &'static str,
        field: &'static str,
    },

    /// The payload type handed out a property whose shape disagrees with its schema.
    #[error("property `{model}.{field}` does not match its declared kind `{expected}`")]
    PropertyKindMismatch {
        model: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid sanitize scope pattern `{pattern}`: {reason}")]
    InvalidScopePattern { pattern: String, reason: String },
}
