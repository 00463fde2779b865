//! Server errors and their HTTP mapping.
//!
//! Every error leaves the server as `{"error": {"code", "message"}}`.
//! Messages of server-side failures are logged, never returned.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tfstate_blob::BlobError;
use tfstate_engine::EngineError;
use tfstate_meta::MetaError;
use tfstate_types::TypeError;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("method {0} not allowed on this route")]
    MethodNotAllowed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("metadata store error: {0}")]
    Meta(#[from] MetaError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TypeError> for ServerError {
    fn from(err: TypeError) -> Self {
        Self::Engine(EngineError::InvalidArgument(err))
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Engine(err) => match err {
                EngineError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
                EngineError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
                EngineError::AlreadyLocked { .. } => (StatusCode::CONFLICT, "ALREADY_LOCKED"),
                EngineError::InvalidLockToken(_) => (StatusCode::CONFLICT, "INVALID_LOCK_TOKEN"),
                EngineError::LockNotFound(_) => (StatusCode::NOT_FOUND, "LOCK_NOT_FOUND"),
                EngineError::VersionNotFound { .. } => (StatusCode::NOT_FOUND, "VERSION_NOT_FOUND"),
                EngineError::StorageUnavailable(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_UNAVAILABLE")
                }
                EngineError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::Config(_) | Self::Meta(_) | Self::Blob(_) | Self::Io(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("ApiKey"));
        }
        response
    }
}
