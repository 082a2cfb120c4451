use axum::{extract::State, http::StatusCode};
use carelink_api::{ApiJson, ApiResult};
use carelink_auth::BearerAuth;
use carelink_records::{DoctorInput, UpdateMode};
use carelink_storage::Doctor;

use super::IdPath;
use crate::server::AppState;

pub async fn list(
    BearerAuth(_): BearerAuth,
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Vec<Doctor>>> {
    Ok(ApiJson(state.records.doctors.list().await?))
}

pub async fn create(
    BearerAuth(_): BearerAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<DoctorInput>,
) -> ApiResult<(StatusCode, ApiJson<Doctor>)> {
    let doctor = state.records.doctors.create(input).await?;
    Ok((StatusCode::CREATED, ApiJson(doctor)))
}

pub async fn read(
    BearerAuth(_): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Doctor>> {
    Ok(ApiJson(state.records.doctors.get(id).await?))
}

pub async fn replace(
    BearerAuth(_): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<DoctorInput>,
) -> ApiResult<ApiJson<Doctor>> {
    let doctor = state.records.doctors.update(id, input, UpdateMode::Full).await?;
    Ok(ApiJson(doctor))
}

pub async fn modify(
    BearerAuth(_): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<DoctorInput>,
) -> ApiResult<ApiJson<Doctor>> {
    let doctor = state
        .records
        .doctors
        .update(id, input, UpdateMode::Partial)
        .await?;
    Ok(ApiJson(doctor))
}

pub async fn delete(
    BearerAuth(_): BearerAuth,
    IdPath(id): IdPath,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    state.records.doctors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
