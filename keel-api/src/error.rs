//! API error handling.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use keel_core::error::KeelError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message, "CONFLICT")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
    }

    /// Maps a service error, replacing store failure details with `failure`.
    ///
    /// Client-caused errors keep their own message; store failures are logged
    /// and reported with the fixed operation message.
    pub fn from_service(err: KeelError, failure: &str) -> Self {
        if err.is_client_error() {
            return Self::from(err);
        }

        tracing::error!(error = %err, retryable = err.is_recoverable(), "{}", failure);
        match err {
            KeelError::StoreTimeout { .. } => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, failure, "STORE_TIMEOUT")
            }
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure, "STORE_ERROR"),
        }
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<KeelError> for ApiError {
    fn from(err: KeelError) -> Self {
        match &err {
            KeelError::InvalidInput(_) => ApiError::bad_request(err.to_string()),
            KeelError::ValidationError(_) => ApiError::validation(err.to_string()),
            KeelError::FieldNotFound { .. } | KeelError::CadenceNotFound { .. } => {
                ApiError::not_found(err.to_string())
            }
            KeelError::ConstraintViolation(_) => ApiError::conflict(err.to_string()),
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
