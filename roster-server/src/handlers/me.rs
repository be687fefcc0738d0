use axum::{
    Extension,
    extract::State,
    response::Json,
};

use roster_core::domain::access::Principal;
use roster_model::{
    AgencyOption, ApiResponse, BootstrapRequest, Member, OnboardingRequest, RoleSyncOutcome,
    WhoAmI,
};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn whoami(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<WhoAmI>>> {
    let whoami = state.onboarding.whoami(&principal).await?;
    Ok(Json(ApiResponse::success(whoami)))
}

pub async fn sync_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<RoleSyncOutcome>>> {
    let outcome = state.onboarding.sync_role(&principal).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn onboarding_agencies(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<Vec<AgencyOption>>>> {
    let options = state.onboarding.agency_options().await?;
    Ok(Json(ApiResponse::success(options)))
}

pub async fn complete_onboarding(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<OnboardingRequest>,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state.onboarding.complete(&principal, request).await?;
    Ok(Json(ApiResponse::success(member)))
}

pub async fn bootstrap(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<BootstrapRequest>,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state.onboarding.bootstrap(&principal, request).await?;
    Ok(Json(ApiResponse::success(member)))
}
