//! Eventide API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventide_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The event store could not be prepared.
    #[error("event store error: {0}")]
    EventStore(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code and error code for the wrapped error.
    ///
    /// Store and publish failures are classified by the collaborator error
    /// they carry, so a conflict or deadline keeps its own status.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self.0.root_cause() {
            DomainError::AggregateNotFound(_) => (StatusCode::NOT_FOUND, "aggregate_not_found"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::DeadlineExceeded { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded")
            }
            _ => match &self.0 {
                DomainError::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
                DomainError::Replay { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "replay_error"),
                DomainError::Publish { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "publish_error")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error"),
            },
        }
    }

    fn message(&self) -> String {
        let outer = self.0.to_string();
        let root = self.0.root_cause();
        if std::ptr::eq(root, &self.0) {
            outer
        } else {
            format!("{outer}: {root}")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.classify();
        if status.is_server_error() {
            error!(error = %self.message(), error_code, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}
