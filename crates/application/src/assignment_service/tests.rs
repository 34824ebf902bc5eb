use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserId, UserIdentity};
use campora_domain::{PermissionCode, Role, RoleAssignment, RoleGrant, RoleType};
use tokio::sync::Mutex;

use crate::{
    AssignmentOutcome, AssignmentRepository, AuditEvent, AuditRepository, ResolutionCache,
    RoleRepository,
};

use super::{AssignRoleInput, AssignmentService};

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
struct FakeRoleRepository {
    roles: Mutex<HashMap<RoleId, Role>>,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        self.roles.lock().await.insert(role.id, role);
        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.lock().await.get(&role_id).cloned())
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .values()
            .find(|role| role.code == code)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.lock().await.values().cloned().collect())
    }

    async fn set_parent_role(&self, _role_id: RoleId, _parent: Option<RoleId>) -> AppResult<()> {
        Ok(())
    }

    async fn list_grants(&self, _role_id: RoleId) -> AppResult<Vec<RoleGrant>> {
        Ok(Vec::new())
    }

    async fn upsert_grant(&self, _grant: RoleGrant) -> AppResult<()> {
        Ok(())
    }

    async fn delete_grant(
        &self,
        _role_id: RoleId,
        _permission: &PermissionCode,
        _department_filter: Option<DepartmentId>,
    ) -> AppResult<bool> {
        Ok(false)
    }
}

#[derive(Default)]
struct FakeAssignmentRepository {
    rows: Mutex<Vec<RoleAssignment>>,
}

fn same_key(row: &RoleAssignment, other: &RoleAssignment) -> bool {
    row.user_id == other.user_id
        && row.role_id == other.role_id
        && row.department == other.department
}

#[async_trait]
impl AssignmentRepository for FakeAssignmentRepository {
    async fn upsert(&self, assignment: RoleAssignment) -> AppResult<AssignmentOutcome> {
        let mut rows = self.rows.lock().await;
        let created = !rows.iter().any(|row| same_key(row, &assignment));
        rows.retain(|row| !same_key(row, &assignment));
        rows.push(assignment.clone());
        Ok(AssignmentOutcome { assignment, created })
    }

    async fn create_if_absent(&self, assignment: RoleAssignment) -> AppResult<AssignmentOutcome> {
        let mut rows = self.rows.lock().await;
        if let Some(existing) = rows.iter().find(|row| same_key(row, &assignment)) {
            return Ok(AssignmentOutcome {
                assignment: existing.clone(),
                created: false,
            });
        }
        rows.push(assignment.clone());
        Ok(AssignmentOutcome {
            assignment,
            created: true,
        })
    }

    async fn delete(
        &self,
        user_id: UserId,
        role_id: RoleId,
        department: Option<DepartmentId>,
    ) -> AppResult<bool> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|row| {
            row.user_id != user_id || row.role_id != role_id || row.department != department
        });
        Ok(rows.len() < before)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| {
                row.user_id == user_id
                    && (department.is_none()
                        || row.department.is_none()
                        || row.department == department)
            })
            .cloned()
            .collect())
    }
}

fn actor() -> UserIdentity {
    UserIdentity::new(UserId::new(), "Test Admin", None)
}

async fn service_with_role() -> (AssignmentService, Role, Arc<FakeAuditRepository>) {
    let assignment_repository = Arc::new(FakeAssignmentRepository::default());
    let role_repository = Arc::new(FakeRoleRepository::default());
    let audit_repository = Arc::new(FakeAuditRepository::default());

    let role = Role::new("teacher", "Teacher", RoleType::Business)
        .unwrap_or_else(|_| panic!("role should be valid"));
    role_repository.roles.lock().await.insert(role.id, role.clone());

    let service = AssignmentService::new(
        assignment_repository,
        role_repository,
        ResolutionCache::default(),
        audit_repository.clone(),
    );
    (service, role, audit_repository)
}

#[tokio::test]
async fn assign_role_creates_a_ledger_row() {
    let (service, role, audit_repository) = service_with_role().await;
    let user_id = UserId::new();

    let outcome = service
        .assign_role(
            &actor(),
            AssignRoleInput {
                user_id,
                role_id: role.id,
                department: None,
                is_temporary: false,
                valid_days: None,
                notes: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("assignment should succeed"));

    assert!(outcome.created);
    assert_eq!(outcome.assignment.user_id, user_id);
    assert!(outcome.assignment.valid_until.is_none());
    assert_eq!(audit_repository.events.lock().await.len(), 1);
}

#[tokio::test]
async fn reassigning_updates_instead_of_duplicating() {
    let (service, role, _) = service_with_role().await;
    let user_id = UserId::new();

    let first = service
        .assign_role(
            &actor(),
            AssignRoleInput {
                user_id,
                role_id: role.id,
                department: None,
                is_temporary: false,
                valid_days: None,
                notes: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("assignment should succeed"));
    let second = service
        .assign_role(
            &actor(),
            AssignRoleInput {
                user_id,
                role_id: role.id,
                department: None,
                is_temporary: true,
                valid_days: Some(7),
                notes: Some("substitute cover".to_owned()),
            },
        )
        .await
        .unwrap_or_else(|_| panic!("re-assignment should succeed"));

    assert!(first.created);
    assert!(!second.created);
    assert!(second.assignment.is_temporary);
    assert!(second.assignment.valid_until.is_some());

    let rows = service
        .assignments_for_user(user_id, None)
        .await
        .unwrap_or_else(|_| panic!("listing should succeed"));
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn department_scoped_rows_are_distinct_from_global_rows() {
    let (service, role, _) = service_with_role().await;
    let user_id = UserId::new();
    let mathematics = DepartmentId::new();
    let physics = DepartmentId::new();

    for department in [None, Some(mathematics), Some(physics)] {
        service
            .assign_role(
                &actor(),
                AssignRoleInput {
                    user_id,
                    role_id: role.id,
                    department,
                    is_temporary: false,
                    valid_days: None,
                    notes: None,
                },
            )
            .await
            .unwrap_or_else(|_| panic!("assignment should succeed"));
    }

    let scoped = service
        .assignments_for_user(user_id, Some(mathematics))
        .await
        .unwrap_or_else(|_| panic!("listing should succeed"));

    // The mathematics row plus the global row; the physics row is out.
    assert_eq!(scoped.len(), 2);
    assert!(scoped.iter().all(|row| row.department != Some(physics)));
}

#[tokio::test]
async fn oversized_valid_days_is_a_validation_error() {
    let (service, role, _) = service_with_role().await;

    let result = service
        .assign_role(
            &actor(),
            AssignRoleInput {
                user_id: UserId::new(),
                role_id: role.id,
                department: None,
                is_temporary: true,
                valid_days: Some(u32::MAX),
                notes: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn assigning_an_unknown_role_is_not_found() {
    let (service, _, _) = service_with_role().await;

    let result = service
        .assign_role(
            &actor(),
            AssignRoleInput {
                user_id: UserId::new(),
                role_id: RoleId::new(),
                department: None,
                is_temporary: false,
                valid_days: None,
                notes: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn remove_role_deletes_the_row() {
    let (service, role, audit_repository) = service_with_role().await;
    let user_id = UserId::new();

    service
        .assign_role(
            &actor(),
            AssignRoleInput {
                user_id,
                role_id: role.id,
                department: None,
                is_temporary: false,
                valid_days: None,
                notes: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("assignment should succeed"));
    service
        .remove_role(&actor(), user_id, role.id, None)
        .await
        .unwrap_or_else(|_| panic!("removal should succeed"));

    let rows = service
        .assignments_for_user(user_id, None)
        .await
        .unwrap_or_else(|_| panic!("listing should succeed"));
    assert!(rows.is_empty());
    assert_eq!(audit_repository.events.lock().await.len(), 2);

    let result = service.remove_role(&actor(), user_id, role.id, None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
