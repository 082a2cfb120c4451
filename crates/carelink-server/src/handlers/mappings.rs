use axum::{extract::State, http::StatusCode};
use carelink_api::{ApiJson, ApiResult};
use carelink_auth::BearerAuth;
use carelink_records::MappingInput;
use carelink_storage::{Doctor, Mapping};

use super::IdPath;
use crate::server::AppState;

pub async fn list(
    BearerAuth(principal): BearerAuth,
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Vec<Mapping>>> {
    Ok(ApiJson(state.records.mappings.list(principal.id).await?))
}

pub async fn create(
    BearerAuth(principal): BearerAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MappingInput>,
) -> ApiResult<(StatusCode, ApiJson<Mapping>)> {
    let mapping = state.records.mappings.create(principal.id, input).await?;
    Ok((StatusCode::CREATED, ApiJson(mapping)))
}

pub async fn doctors_for_patient(
    BearerAuth(principal): BearerAuth,
    IdPath(patient_id): IdPath,
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Vec<Doctor>>> {
    let doctors = state
        .records
        .mappings
        .doctors_for_patient(principal.id, patient_id)
        .await?;
    Ok(ApiJson(doctors))
}

pub async fn delete(
    BearerAuth(principal): BearerAuth,
    IdPath(mapping_id): IdPath,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    state.records.mappings.delete(principal.id, mapping_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
