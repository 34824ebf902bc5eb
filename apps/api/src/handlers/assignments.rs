use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use campora_application::AssignRoleInput;
use campora_core::UserIdentity;

use crate::dto::{
    AssignRoleRequest, AssignmentOutcomeResponse, AssignmentResponse, RemoveAssignmentRequest,
    parse_department_id, parse_role_id, parse_user_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DepartmentQuery {
    pub department: Option<String>,
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentOutcomeResponse>)> {
    let input = AssignRoleInput {
        user_id: parse_user_id(payload.user_id.as_str())?,
        role_id: parse_role_id(payload.role_id.as_str())?,
        department: parse_department_id(payload.department_id.as_deref())?,
        is_temporary: payload.is_temporary,
        valid_days: payload.valid_days,
        notes: payload.notes,
    };

    let outcome = state.assignment_service.assign_role(&user, input).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(AssignmentOutcomeResponse::from(outcome))))
}

pub async fn remove_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RemoveAssignmentRequest>,
) -> ApiResult<StatusCode> {
    let user_id = parse_user_id(payload.user_id.as_str())?;
    let role_id = parse_role_id(payload.role_id.as_str())?;
    let department = parse_department_id(payload.department_id.as_deref())?;

    state
        .assignment_service
        .remove_role(&user, user_id, role_id, department)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_assignments_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DepartmentQuery>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let user_id = parse_user_id(user_id.as_str())?;
    let department = parse_department_id(query.department.as_deref())?;

    let assignments = state
        .assignment_service
        .assignments_for_user(user_id, department)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}
