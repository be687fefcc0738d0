use axum::{
    Extension,
    extract::{Path, State},
    response::Json,
};

use roster_core::domain::access::Principal;
use roster_model::{ApiResponse, DiagnosticsReport, Member, MemberId, RoleRepairRequest};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn diagnostics(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<DiagnosticsReport>>> {
    let report = state.admin.diagnostics(&principal).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn repair_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<MemberId>,
    Json(request): Json<RoleRepairRequest>,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state.admin.repair_role(&principal, id, request).await?;
    Ok(Json(ApiResponse::success(member)))
}
