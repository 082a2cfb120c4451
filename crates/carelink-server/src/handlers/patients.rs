use axum::{extract::State, http::StatusCode};
use carelink_api::{ApiJson, ApiResult};
use carelink_auth::BearerAuth;
use carelink_records::{PatientInput, UpdateMode};
use carelink_storage::Patient;

use super::IdPath;
use crate::server::AppState;

pub async fn list(
    BearerAuth(principal): BearerAuth,
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Vec<Patient>>> {
    Ok(ApiJson(state.records.patients.list(principal.id).await?))
}

pub async fn create(
    BearerAuth(principal): BearerAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PatientInput>,
) -> ApiResult<(StatusCode, ApiJson<Patient>)> {
    let patient = state.records.patients.create(principal.id, input).await?;
    Ok((StatusCode::CREATED, ApiJson(patient)))
}

pub async fn read(
    BearerAuth(principal): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Patient>> {
    Ok(ApiJson(state.records.patients.get(principal.id, id).await?))
}

pub async fn replace(
    BearerAuth(principal): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PatientInput>,
) -> ApiResult<ApiJson<Patient>> {
    let patient = state
        .records
        .patients
        .update(principal.id, id, input, UpdateMode::Full)
        .await?;
    Ok(ApiJson(patient))
}

pub async fn modify(
    BearerAuth(principal): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PatientInput>,
) -> ApiResult<ApiJson<Patient>> {
    let patient = state
        .records
        .patients
        .update(principal.id, id, input, UpdateMode::Partial)
        .await?;
    Ok(ApiJson(patient))
}

pub async fn delete(
    BearerAuth(principal): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    state.records.patients.delete(principal.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
