use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};

use campora_domain::PermissionCode;

use crate::dto::{
    CheckPermissionRequest, CheckPermissionResponse, UserPermissionsResponse, parse_department_id,
    parse_user_id,
};
use crate::error::ApiResult;
use crate::handlers::assignments::DepartmentQuery;
use crate::state::AppState;

pub async fn user_permissions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DepartmentQuery>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let user_id = parse_user_id(user_id.as_str())?;
    let department = parse_department_id(query.department.as_deref())?;

    let permissions = state
        .resolver
        .resolve_permissions(user_id, department)
        .await?
        .into_iter()
        .map(|permission| permission.to_string())
        .collect();

    Ok(Json(UserPermissionsResponse {
        user_id: user_id.to_string(),
        department_id: department.map(|department| department.to_string()),
        permissions,
    }))
}

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Json(payload): Json<CheckPermissionRequest>,
) -> ApiResult<Json<CheckPermissionResponse>> {
    let user_id = parse_user_id(payload.user_id.as_str())?;
    let permission = PermissionCode::from_str(payload.permission_code.as_str())?;
    let department = parse_department_id(payload.department_id.as_deref())?;

    let allowed = state
        .resolver
        .has_permission(user_id, &permission, department)
        .await?;

    Ok(Json(CheckPermissionResponse { allowed }))
}
