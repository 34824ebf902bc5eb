use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use campora_application::CreateRoleInput;
use campora_core::UserIdentity;
use campora_domain::{PermissionCode, RoleType};

use crate::dto::{
    BulkGrantRequest, BulkGrantResponse, CreateRoleRequest, RevokeGrantRequest, RoleResponse,
    SetParentRoleRequest, parse_department_id, parse_role_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role_type = RoleType::from_str(payload.role_type.as_str())?;

    let role = state
        .role_service
        .create_role(CreateRoleInput {
            code: payload.code,
            name: payload.name,
            role_type,
            description: payload.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn set_parent_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<SetParentRoleRequest>,
) -> ApiResult<StatusCode> {
    let role_id = parse_role_id(role_id.as_str())?;
    let parent = payload
        .parent_role_id
        .as_deref()
        .map(parse_role_id)
        .transpose()?;

    state.role_service.set_parent_role(&user, role_id, parent).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn role_permissions_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let role_id = parse_role_id(role_id.as_str())?;

    let permissions = state
        .role_service
        .effective_permissions(role_id)
        .await?
        .into_iter()
        .map(|permission| permission.to_string())
        .collect();

    Ok(Json(permissions))
}

pub async fn bulk_grant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<BulkGrantRequest>,
) -> ApiResult<Json<BulkGrantResponse>> {
    let role_id = parse_role_id(role_id.as_str())?;

    let outcome = state
        .role_service
        .bulk_assign_permissions(&user, role_id, payload.codes)
        .await?;

    Ok(Json(BulkGrantResponse::from(outcome)))
}

pub async fn revoke_grant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<RevokeGrantRequest>,
) -> ApiResult<StatusCode> {
    let role_id = parse_role_id(role_id.as_str())?;
    let permission = PermissionCode::from_str(payload.permission_code.as_str())?;
    let department = parse_department_id(payload.department_id.as_deref())?;

    state
        .role_service
        .revoke_permission(&user, role_id, &permission, department)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
