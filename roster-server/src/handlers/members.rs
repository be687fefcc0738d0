use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use roster_core::domain::access::Principal;
use roster_model::{
    ApiResponse, AssignRoleRequest, CreateMemberRequest, Member, MemberId, MemberQuery, Page,
    UpdateMemberRequest,
};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<ApiResponse<Page<Member>>>> {
    let page = state.members.list(&principal, query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<MemberId>,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state.members.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(member)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateMemberRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Member>>)> {
    let member = state.members.create(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(member))))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<MemberId>,
    Json(request): Json<UpdateMemberRequest>,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state.members.update(&principal, id, request).await?;
    Ok(Json(ApiResponse::success(member)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<MemberId>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.members.delete(&principal, id).await?;
    Ok(Json(
        ApiResponse::success(()).with_message(format!("member {id} deleted")),
    ))
}

pub async fn assign_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<MemberId>,
    Json(request): Json<AssignRoleRequest>,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state
        .members
        .assign_role(&principal, id, request.role)
        .await?;
    Ok(Json(ApiResponse::success(member)))
}
