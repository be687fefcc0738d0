use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use roster_core::domain::access::Principal;
use roster_model::{
    Agency, AgencyId, AgencyQuery, AgencySummary, ApiResponse, CreateAgencyRequest, Member,
    MemberQuery, Page, UpdateAgencyRequest,
};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AgencyQuery>,
) -> AppResult<Json<ApiResponse<Page<AgencySummary>>>> {
    let page = state.agencies.list(&principal, query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<AgencyId>,
) -> AppResult<Json<ApiResponse<Agency>>> {
    let agency = state.agencies.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(agency)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateAgencyRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Agency>>)> {
    let agency = state.agencies.create(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(agency))))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<AgencyId>,
    Json(request): Json<UpdateAgencyRequest>,
) -> AppResult<Json<ApiResponse<Agency>>> {
    let agency = state.agencies.update(&principal, id, request).await?;
    Ok(Json(ApiResponse::success(agency)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<AgencyId>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.agencies.delete(&principal, id).await?;
    Ok(Json(
        ApiResponse::success(()).with_message(format!("agency {id} deleted")),
    ))
}

/// Members of one agency; the same listing as `GET /members` pinned to
/// the path's agency.
pub async fn members(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<AgencyId>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<ApiResponse<Page<Member>>>> {
    state.agencies.get(&principal, id).await?;
    let query = MemberQuery {
        agency_id: Some(id),
        ..query
    };
    let page = state.members.list(&principal, query).await?;
    Ok(Json(ApiResponse::success(page)))
}
