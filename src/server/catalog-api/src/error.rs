//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{debug, error};

use catalog_storage::{StorageError, ValidationError};

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    /// Request decoded but carries an invalid product.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Path did not match any route.
    #[error("no route for {0}")]
    RouteNotFound(String),

    /// Storage layer failure, including not-found.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();

        if status.is_server_error() {
            error!(error = %msg, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %msg, "request rejected");
        }

        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}
