//! Service error types with HTTP status code mapping.
//!
//! [`BotError`] is the central error type. Lifecycle handlers log it and
//! carry on; the operator HTTP surface maps each variant to a status code
//! and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::platform::PlatformError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: guild id must be numeric",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 403       |
/// | 3000–3999 | Server          | 500 Internal Server Error   |
/// | 5000–5999 | Chat platform   | 502 Bad Gateway             |
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The invoking member lacks the required permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A chat platform call failed.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The archive category refused another channel.
    #[error("archive rejected channel: {0}")]
    ArchiveFull(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Forbidden(_) => 1003,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Platform(_) => 5001,
            Self::ArchiveFull(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Platform(_) | Self::ArchiveFull(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
