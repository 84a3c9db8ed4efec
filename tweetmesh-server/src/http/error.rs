//! API error types with IntoResponse
//!
//! Every failure is recovered here and rendered as
//! `{"error": kind, "message": text}` with the matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::discovery::DiscoveryError;
use crate::models::ValidationError;
use crate::txn::{LedgerError, ProtocolError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Unparseable path parameter or request body (400)
    BadRequest { message: String },

    /// Entity or session token absent (404)
    NotFound { resource: &'static str, id: String },

    /// Duplicate unique key (400)
    Conflict { message: String },

    /// Registry or peer failure (400, caller retries)
    Upstream(DiscoveryError),

    /// Request deadline elapsed (408)
    DeadlineExceeded { seconds: u64 },

    /// Database error (500, logged)
    Database(DbError),

    /// Any other server-side failure (500, logged)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_request",
                    "message": message
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Upstream(e) => {
                tracing::warn!("Upstream failure: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "upstream_error",
                        "message": e.to_string()
                    }),
                )
            }
            Self::DeadlineExceeded { seconds } => {
                tracing::debug!(deadline_secs = seconds, "Rendering deadline response");
                (
                    StatusCode::REQUEST_TIMEOUT,
                    json!({
                        "error": "timeout",
                        "message": "Request timed out"
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict { message },
            _ => Self::Database(e),
        }
    }
}

impl From<DiscoveryError> for ApiError {
    fn from(e: DiscoveryError) -> Self {
        Self::Upstream(e)
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(token) => Self::NotFound {
                resource: "session",
                id: token.to_string(),
            },
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Ledger(e) => e.into(),
            ProtocolError::Db(e) => e.into(),
            ProtocolError::Interrupted(e) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}
