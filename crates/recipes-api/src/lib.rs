use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use recipes_core::CoreError;
use recipes_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body returned to clients for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Confirmation body for operations that do not return a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Message sent in place of any infrastructure failure detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// High-level API errors mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Infrastructure failure. `kind` labels the failing subsystem on
    /// the log line; `detail` is never sent to the client.
    #[error("Internal server error: {detail}")]
    Internal { kind: &'static str, detail: String },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::infrastructure("internal", msg)
    }
    pub fn infrastructure(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::Internal {
            kind,
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the client. Internal details are replaced.
    pub fn public_message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                msg
            }
            ApiError::Internal { .. } => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The only place infrastructure failures are logged.
        if let ApiError::Internal { kind, detail } = &self {
            tracing::error!(kind, error = %detail, "request failed with internal error");
        }
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidId(id) => ApiError::bad_request(format!("invalid recipe id: {id}")),
            CoreError::InvalidRecipe { message } => ApiError::bad_request(message),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id } => ApiError::not_found(format!("recipe {id} not found")),
            other => ApiError::infrastructure(other.kind(), other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
