//! HTTP error responses.

use crate::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fabula_error::{FabulaError, StoryError};

const INTERNAL_ERROR: &str = "Internal server error.";

/// An error returned to the caller as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{}: {}", status, message)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Message placed in the body
    pub message: String,
}

impl ApiError {
    /// 400 carrying the validation message.
    pub fn bad_request(err: &StoryError) -> Self {
        tracing::warn!(error = %err.kind, "Rejected request");
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.kind.to_string(),
        }
    }

    /// 500 with a fixed, endpoint specific message. The cause is logged only.
    pub fn generation(message: &str, err: &FabulaError) -> Self {
        tracing::error!(error = %err, "{}", message);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    /// 404 for a file that doesn't exist or may not be served.
    pub fn not_found(filename: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("File not found: {}", filename),
        }
    }
}

impl From<StoryError> for ApiError {
    /// 400 for caller mistakes, 500 for anything the server produced itself.
    fn from(err: StoryError) -> Self {
        if err.kind.is_client_error() {
            Self::bad_request(&err)
        } else {
            tracing::error!(error = %err, "Story error outside request validation");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: INTERNAL_ERROR.to_string(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
