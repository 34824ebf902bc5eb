//! Request and response payloads for the permissions API.

use std::str::FromStr;

use campora_application::{
    AppliedEntry, AssignmentOutcome, BatchApplyOutcome, BulkGrantOutcome, SeedOutcome,
};
use campora_core::{AppError, DepartmentId, RoleId, UserId};
use campora_domain::{
    Action, CatalogEntry, PermissionModule, Role, RoleAssignment, RoleTemplate, Scope,
    TemplateEntry,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Request payload for creating a permission module.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-module-request.ts"
)]
pub struct CreateModuleRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// API representation of a permission module.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-response.ts"
)]
pub struct ModuleResponse {
    pub code: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub sort_order: i32,
}

impl From<PermissionModule> for ModuleResponse {
    fn from(module: PermissionModule) -> Self {
        Self {
            code: module.code,
            name: module.name,
            description: module.description,
            is_active: module.is_active,
            sort_order: module.sort_order,
        }
    }
}

/// Request payload for creating one catalog permission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub module_code: String,
    pub functionality_code: String,
    pub action: String,
    pub scope: String,
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requires_approval: bool,
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub code: String,
    pub module_code: String,
    pub functionality_code: String,
    pub action: String,
    pub scope: String,
    pub name: String,
    pub description: String,
    pub is_dangerous: bool,
    pub requires_approval: bool,
}

impl From<CatalogEntry> for PermissionResponse {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            code: entry.code.to_string(),
            module_code: entry.code.module_code().to_owned(),
            functionality_code: entry.code.functionality_code().to_owned(),
            action: entry.code.action().as_str().to_owned(),
            scope: entry.code.scope().as_str().to_owned(),
            name: entry.name,
            description: entry.description,
            is_dangerous: entry.is_dangerous,
            requires_approval: entry.requires_approval,
        }
    }
}

/// One functionality and the actions to seed for it.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/functionality-actions.ts"
)]
pub struct FunctionalityActions {
    pub functionality: String,
    pub actions: Vec<String>,
}

/// Request payload for seeding one module's permission grid.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/seed-permissions-request.ts"
)]
pub struct SeedPermissionsRequest {
    pub module_code: String,
    pub functionalities: Vec<FunctionalityActions>,
}

/// One code a bulk operation could not process.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/code-failure-response.ts"
)]
pub struct CodeFailureResponse {
    pub code: String,
    pub error: String,
}

/// Outcome of seeding one module's permission grid.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/seed-outcome-response.ts"
)]
pub struct SeedOutcomeResponse {
    pub created: Vec<String>,
    pub failed: Vec<CodeFailureResponse>,
}

impl From<SeedOutcome> for SeedOutcomeResponse {
    fn from(outcome: SeedOutcome) -> Self {
        Self {
            created: outcome.created,
            failed: outcome
                .failed
                .into_iter()
                .map(|failure| CodeFailureResponse {
                    code: failure.code,
                    error: failure.error,
                })
                .collect(),
        }
    }
}

/// Request payload for creating a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub code: String,
    pub name: String,
    pub role_type: String,
    #[serde(default)]
    pub description: String,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub role_type: String,
    pub description: String,
    pub is_active: bool,
    pub is_super_admin: bool,
    pub parent_role_id: Option<String>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.to_string(),
            code: role.code,
            name: role.name,
            role_type: role.role_type.as_str().to_owned(),
            description: role.description,
            is_active: role.is_active,
            is_super_admin: role.is_super_admin,
            parent_role_id: role.parent_role.map(|parent| parent.to_string()),
        }
    }
}

/// Request payload for re-parenting a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-parent-role-request.ts"
)]
pub struct SetParentRoleRequest {
    pub parent_role_id: Option<String>,
}

/// Request payload for bulk-granting permission codes to a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bulk-grant-request.ts"
)]
pub struct BulkGrantRequest {
    pub codes: Vec<String>,
}

/// Outcome of a bulk permission grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bulk-grant-response.ts"
)]
pub struct BulkGrantResponse {
    pub assigned: Vec<String>,
    pub failed: Vec<CodeFailureResponse>,
}

impl From<BulkGrantOutcome> for BulkGrantResponse {
    fn from(outcome: BulkGrantOutcome) -> Self {
        Self {
            assigned: outcome.assigned,
            failed: outcome
                .failed
                .into_iter()
                .map(|failure| CodeFailureResponse {
                    code: failure.code,
                    error: failure.error,
                })
                .collect(),
        }
    }
}

/// Request payload for revoking one grant from a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/revoke-grant-request.ts"
)]
pub struct RevokeGrantRequest {
    pub permission_code: String,
    pub department_id: Option<String>,
}

/// Request payload for assigning a role to a user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub user_id: String,
    pub role_id: String,
    pub department_id: Option<String>,
    #[serde(default)]
    pub is_temporary: bool,
    pub valid_days: Option<u32>,
    pub notes: Option<String>,
}

/// Request payload for removing a role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/remove-assignment-request.ts"
)]
pub struct RemoveAssignmentRequest {
    pub user_id: String,
    pub role_id: String,
    pub department_id: Option<String>,
}

/// API representation of one ledger row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-response.ts"
)]
pub struct AssignmentResponse {
    pub user_id: String,
    pub role_id: String,
    pub department_id: Option<String>,
    pub is_temporary: bool,
    #[ts(type = "string | null")]
    pub valid_from: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub valid_until: Option<DateTime<Utc>>,
    pub assigned_by: Option<String>,
    #[ts(type = "string")]
    pub assigned_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl From<RoleAssignment> for AssignmentResponse {
    fn from(assignment: RoleAssignment) -> Self {
        let is_active = assignment.is_active_at(Utc::now());
        Self {
            user_id: assignment.user_id.to_string(),
            role_id: assignment.role_id.to_string(),
            department_id: assignment.department.map(|department| department.to_string()),
            is_temporary: assignment.is_temporary,
            valid_from: assignment.valid_from,
            valid_until: assignment.valid_until,
            assigned_by: assignment.assigned_by.map(|user| user.to_string()),
            assigned_at: assignment.assigned_at,
            notes: assignment.notes,
            is_active,
        }
    }
}

/// Outcome of one ledger write.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-outcome-response.ts"
)]
pub struct AssignmentOutcomeResponse {
    pub assignment: AssignmentResponse,
    pub created: bool,
}

impl From<AssignmentOutcome> for AssignmentOutcomeResponse {
    fn from(outcome: AssignmentOutcome) -> Self {
        Self {
            assignment: AssignmentResponse::from(outcome.assignment),
            created: outcome.created,
        }
    }
}

/// Resolved permission set for one user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-permissions-response.ts"
)]
pub struct UserPermissionsResponse {
    pub user_id: String,
    pub department_id: Option<String>,
    pub permissions: Vec<String>,
}

/// Request payload for a single permission check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/check-permission-request.ts"
)]
pub struct CheckPermissionRequest {
    pub user_id: String,
    pub permission_code: String,
    pub department_id: Option<String>,
}

/// Result of a single permission check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/check-permission-response.ts"
)]
pub struct CheckPermissionResponse {
    pub allowed: bool,
}

/// API representation of a role template.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/template-response.ts"
)]
pub struct TemplateResponse {
    pub id: String,
    pub name: String,
    pub template_type: String,
    pub description: String,
    pub is_active: bool,
}

impl From<RoleTemplate> for TemplateResponse {
    fn from(template: RoleTemplate) -> Self {
        Self {
            id: template.id.to_string(),
            name: template.name,
            template_type: template.template_type.as_str().to_owned(),
            description: template.description,
            is_active: template.is_active,
        }
    }
}

/// One role bundled by a template.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/template-entry-response.ts"
)]
pub struct TemplateEntryResponse {
    pub role_id: String,
    pub is_required: bool,
    pub is_temporary: bool,
    pub valid_days: Option<u32>,
    pub sort_order: i32,
}

impl From<TemplateEntry> for TemplateEntryResponse {
    fn from(entry: TemplateEntry) -> Self {
        Self {
            role_id: entry.role_id.to_string(),
            is_required: entry.is_required,
            is_temporary: entry.is_temporary,
            valid_days: entry.valid_days,
            sort_order: entry.sort_order,
        }
    }
}

/// Request payload for applying a template to one user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/apply-template-request.ts"
)]
pub struct ApplyTemplateRequest {
    pub user_id: String,
    pub department_id: Option<String>,
}

/// One role application produced by a template.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/applied-entry-response.ts"
)]
pub struct AppliedEntryResponse {
    pub role_code: String,
    pub created: bool,
}

impl From<AppliedEntry> for AppliedEntryResponse {
    fn from(entry: AppliedEntry) -> Self {
        Self {
            role_code: entry.role_code,
            created: entry.created,
        }
    }
}

/// Request payload for applying a template to a batch of users.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/apply-template-batch-request.ts"
)]
pub struct ApplyTemplateBatchRequest {
    pub user_ids: Vec<String>,
    pub department_id: Option<String>,
}

/// One user a batch application could not process.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-failure-response.ts"
)]
pub struct BatchFailureResponse {
    pub user_id: String,
    pub error: String,
}

/// Outcome of a batch template application.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-apply-response.ts"
)]
pub struct BatchApplyResponse {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailureResponse>,
}

impl From<BatchApplyOutcome> for BatchApplyResponse {
    fn from(outcome: BatchApplyOutcome) -> Self {
        Self {
            succeeded: outcome
                .succeeded
                .into_iter()
                .map(|user| user.to_string())
                .collect(),
            failed: outcome
                .failed
                .into_iter()
                .map(|failure| BatchFailureResponse {
                    user_id: failure.user_id.to_string(),
                    error: failure.error,
                })
                .collect(),
        }
    }
}

/// Parses a UUID path or body value into a user id.
pub fn parse_user_id(value: &str) -> Result<UserId, AppError> {
    parse_uuid(value, "user id").map(UserId::from_uuid)
}

/// Parses a UUID path or body value into a role id.
pub fn parse_role_id(value: &str) -> Result<RoleId, AppError> {
    parse_uuid(value, "role id").map(RoleId::from_uuid)
}

/// Parses an optional UUID value into a department id.
pub fn parse_department_id(value: Option<&str>) -> Result<Option<DepartmentId>, AppError> {
    value
        .map(|value| parse_uuid(value, "department id").map(DepartmentId::from_uuid))
        .transpose()
}

/// Parses an action component from its storage value.
pub fn parse_action(value: &str) -> Result<Action, AppError> {
    Action::from_str(value)
}

/// Parses a scope component from its storage value.
pub fn parse_scope(value: &str) -> Result<Scope, AppError> {
    Scope::from_str(value)
}

fn parse_uuid(value: &str, label: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|error| AppError::Validation(format!("invalid {label} '{value}': {error}")))
}
