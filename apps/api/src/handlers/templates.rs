use axum::Json;
use axum::extract::{Extension, Path, State};

use campora_core::{AppError, TemplateId, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    AppliedEntryResponse, ApplyTemplateBatchRequest, ApplyTemplateRequest, BatchApplyResponse,
    TemplateEntryResponse, TemplateResponse, parse_department_id, parse_user_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_templates_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TemplateResponse>>> {
    let templates = state
        .template_service
        .list_templates()
        .await?
        .into_iter()
        .map(TemplateResponse::from)
        .collect();

    Ok(Json(templates))
}

pub async fn list_template_entries_handler(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> ApiResult<Json<Vec<TemplateEntryResponse>>> {
    let template_id = parse_template_id(template_id.as_str())?;

    let entries = state
        .template_service
        .template_entries(template_id)
        .await?
        .into_iter()
        .map(TemplateEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn apply_template_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(template_id): Path<String>,
    Json(payload): Json<ApplyTemplateRequest>,
) -> ApiResult<Json<Vec<AppliedEntryResponse>>> {
    let template_id = parse_template_id(template_id.as_str())?;
    let user_id = parse_user_id(payload.user_id.as_str())?;
    let department = parse_department_id(payload.department_id.as_deref())?;

    let applied = state
        .template_service
        .apply_to_user(&user, template_id, user_id, department)
        .await?
        .into_iter()
        .map(AppliedEntryResponse::from)
        .collect();

    Ok(Json(applied))
}

pub async fn apply_template_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(template_id): Path<String>,
    Json(payload): Json<ApplyTemplateBatchRequest>,
) -> ApiResult<Json<BatchApplyResponse>> {
    let template_id = parse_template_id(template_id.as_str())?;
    let department = parse_department_id(payload.department_id.as_deref())?;
    let user_ids = payload
        .user_ids
        .iter()
        .map(|user_id| parse_user_id(user_id.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state
        .template_service
        .apply_to_users(&user, template_id, user_ids, department)
        .await?;

    Ok(Json(BatchApplyResponse::from(outcome)))
}

fn parse_template_id(value: &str) -> Result<TemplateId, AppError> {
    Uuid::parse_str(value)
        .map(TemplateId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid template id '{value}': {error}")))
}
