//! HTTP error surface for the Carelink service.
//!
//! Every component error is translated into an [`ApiError`] before it leaves
//! a handler. The error kind decides the status class; the body is a small
//! JSON document:
//!
//! ```json
//! {"error": {"kind": "validation", "message": "Invalid input.", "fields": {"age": ["..."]}}}
//! ```
//!
//! Internal failures are logged in full and answered with a fixed message so
//! no storage or implementation detail reaches the client.

use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use carelink_core::{ErrorKind, FieldErrors, NON_FIELD_ERRORS};
use serde::Serialize;
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "Internal server error";
const VALIDATION_MESSAGE: &str = "Invalid input.";

/// High-level API errors mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Unauthorized(_) => ErrorKind::Authentication,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the client-facing body. Internal detail is replaced by a fixed message.
    pub fn to_error_body(&self) -> ErrorBody {
        let (message, fields) = match self {
            ApiError::Validation(fields) => (VALIDATION_MESSAGE.to_string(), Some(fields.clone())),
            ApiError::Unauthorized(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                (msg.clone(), None)
            }
            ApiError::Internal(_) => (INTERNAL_MESSAGE.to_string(), None),
        };
        ErrorBody {
            error: ErrorDetail {
                kind: self.kind().as_str(),
                message,
                fields,
            },
        }
    }
}

/// JSON error document returned for every failed request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(detail) => tracing::error!(error = %detail, "internal error"),
            other => tracing::debug!(kind = %other.kind(), error = %other, "request rejected"),
        }

        let mut response = (status, axum::Json(self.to_error_body())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"carelink\""),
            );
        }
        response
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(FieldErrors::single(NON_FIELD_ERRORS, rejection.body_text()))
    }
}

/// JSON extractor/response whose rejections surface as validation errors.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
