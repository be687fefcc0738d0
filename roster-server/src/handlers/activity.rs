use axum::{
    Extension,
    extract::{Query, State},
    response::Json,
};

use roster_core::domain::access::Principal;
use roster_model::{ActivityEntry, ActivityQuery, ApiResponse, DashboardSummary, Page};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<ApiResponse<Page<ActivityEntry>>>> {
    let page = state.activity.list(&principal, query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<DashboardSummary>>> {
    let summary = state.admin.dashboard(&principal).await?;
    Ok(Json(ApiResponse::success(summary)))
}
