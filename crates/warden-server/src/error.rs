//! Mapping of core errors onto HTTP responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use warden_core::{Error, StorageError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    Body(String),

    /// No bearer token on a protected route.
    #[error("missing bearer token")]
    MissingToken,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::Core(err) => match err {
                Error::Args(_) | Error::InvalidRole(_) => StatusCode::BAD_REQUEST,
                Error::TokenMalformed
                | Error::TokenExpired
                | Error::TokenNotValidYet
                | Error::TokenUnknown(_) => StatusCode::UNAUTHORIZED,
                Error::NoPermission(_) | Error::Forbidden(_) => StatusCode::FORBIDDEN,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::AlreadyUsed(_) | Error::AlreadyExists(_) => StatusCode::CONFLICT,
                Error::Storage(StorageError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
                Error::Storage(StorageError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
                Error::Storage(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Core(err) => err.code(),
            ApiError::Body(_) => "ARGS",
            ApiError::MissingToken => "TOKEN_MISSING",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        // Backend details stay in the log.
        let message = match &self {
            ApiError::Core(Error::Storage(StorageError::Backend(_))) => "storage failure".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "code": self.code(), "message": message }))).into_response()
    }
}
