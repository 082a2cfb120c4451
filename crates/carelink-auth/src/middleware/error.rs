//! Error response handling for authentication.
//!
//! `AuthError` responds through the shared [`ApiError`] body so every
//! credential problem produces the same 401 shape.

use axum::response::{IntoResponse, Response};
use carelink_api::ApiError;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
