use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use campora_application::{CreateModuleInput, CreatePermissionInput};

use crate::dto::{
    CreateModuleRequest, CreatePermissionRequest, ModuleResponse, PermissionResponse,
    SeedOutcomeResponse, SeedPermissionsRequest, parse_action, parse_scope,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPermissionsQuery {
    pub module: Option<String>,
}

pub async fn list_modules_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ModuleResponse>>> {
    let modules = state
        .catalog_service
        .list_modules()
        .await?
        .into_iter()
        .map(ModuleResponse::from)
        .collect();

    Ok(Json(modules))
}

pub async fn create_module_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateModuleRequest>,
) -> ApiResult<(StatusCode, Json<ModuleResponse>)> {
    let module = state
        .catalog_service
        .create_module(CreateModuleInput {
            code: payload.code,
            name: payload.name,
            description: payload.description,
            sort_order: payload.sort_order,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ModuleResponse::from(module))))
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Query(query): Query<ListPermissionsQuery>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .catalog_service
        .list_permissions(query.module.as_deref())
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let action = parse_action(payload.action.as_str())?;
    let scope = parse_scope(payload.scope.as_str())?;

    let entry = state
        .catalog_service
        .create_permission(CreatePermissionInput {
            module_code: payload.module_code,
            functionality_code: payload.functionality_code,
            action,
            scope,
            name: payload.name,
            description: payload.description,
            requires_approval: payload.requires_approval,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(entry))))
}

pub async fn seed_permissions_handler(
    State(state): State<AppState>,
    Json(payload): Json<SeedPermissionsRequest>,
) -> ApiResult<Json<SeedOutcomeResponse>> {
    let mut functionalities = Vec::with_capacity(payload.functionalities.len());
    for functionality in payload.functionalities {
        let actions = functionality
            .actions
            .iter()
            .map(|action| parse_action(action.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        functionalities.push((functionality.functionality, actions));
    }

    let outcome = state
        .catalog_service
        .create_module_permissions(payload.module_code.as_str(), functionalities)
        .await?;

    Ok(Json(SeedOutcomeResponse::from(outcome)))
}
