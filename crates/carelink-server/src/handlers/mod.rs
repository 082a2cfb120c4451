//! Request handlers. Each handler authenticates first, then reads the path,
//! then the body, so credential failures win over input failures.

pub mod auth;
pub mod doctors;
pub mod mappings;
pub mod patients;

use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
};
use carelink_api::ApiError;
use carelink_core::RecordId;
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'a str>,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Carelink",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            storage: None,
        }),
    )
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.storage.backend_name();
    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                storage: Some(backend),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, storage = backend, "storage not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    storage: Some(backend),
                }),
            )
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

/// Integer id from the `{id}` path segment. Anything else matches no record.
pub struct IdPath(pub RecordId);

impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("Not found."))?;
        raw.parse()
            .map(IdPath)
            .map_err(|_| ApiError::not_found("Not found."))
    }
}
