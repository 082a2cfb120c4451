use axum::{extract::State, http::StatusCode};
use carelink_api::{ApiJson, ApiResult};
use carelink_auth::{
    AccessToken, LoginRequest, PrincipalSummary, RefreshRequest, RegisterRequest, TokenPair,
};

use crate::server::AppState;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, ApiJson<PrincipalSummary>)> {
    let summary = state.auth.identity.register(request).await?;
    Ok((StatusCode::CREATED, ApiJson(summary)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<ApiJson<TokenPair>> {
    let tokens = state.auth.identity.login(request).await?;
    Ok(ApiJson(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> ApiResult<ApiJson<AccessToken>> {
    let token = request.into_token()?;
    let access = state.auth.identity.refresh_session(&token).await?;
    Ok(ApiJson(access))
}
