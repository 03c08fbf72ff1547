//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses. Every business failure reaches the wire as a JSON
//! body `{ "error": <kind>, "message": <text> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

use crate::config::ConfigError;
use lendhub_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The wire shape of every error response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Port(port) => {
                let status = match port {
                    PortError::NotFound(_) => StatusCode::NOT_FOUND,
                    PortError::Validation(_) => StatusCode::BAD_REQUEST,
                    PortError::DuplicateEmail(_) => StatusCode::CONFLICT,
                    PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    ErrorBody {
                        error: port.kind(),
                        message: port.to_string(),
                    },
                )
            }
            other => {
                error!("request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal",
                        message: other.to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
