use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserIdentity};
use campora_domain::{CatalogEntry, PermissionCode, PermissionModule, Role, RoleGrant, RoleType};
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::{AuditEvent, AuditRepository, CatalogRepository, ResolutionCache};

use super::{CreateRoleInput, GrantPermissionInput, RoleGraphService, RoleRepository};

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
    grants: Mutex<Vec<RoleGrant>>,
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

    async fn set_parent_role(&self, role_id: RoleId, parent: Option<RoleId>) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let role = roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        role.parent_role = parent;
        Ok(())
    }

    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<RoleGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.role_id == role_id)
            .cloned()
            .collect())
    }

    async fn upsert_grant(&self, grant: RoleGrant) -> AppResult<()> {
        let mut grants = self.grants.lock().await;
        grants.retain(|existing| {
            existing.role_id != grant.role_id
                || existing.permission != grant.permission
                || existing.department_filter != grant.department_filter
        });
        grants.push(grant);
        Ok(())
    }

    async fn delete_grant(
        &self,
        role_id: RoleId,
        permission: &PermissionCode,
        department_filter: Option<DepartmentId>,
    ) -> AppResult<bool> {
        let mut grants = self.grants.lock().await;
        let before = grants.len();
        grants.retain(|grant| {
            grant.role_id != role_id
                || grant.permission != *permission
                || grant.department_filter != department_filter
        });
        Ok(grants.len() < before)
    }
}

#[derive(Default)]
struct FakeCatalogRepository {
    entries: Mutex<Vec<CatalogEntry>>,
}

#[async_trait]
impl CatalogRepository for FakeCatalogRepository {
    async fn insert_module(&self, _module: PermissionModule) -> AppResult<()> {
        Ok(())
    }

    async fn find_module(&self, _code: &str) -> AppResult<Option<PermissionModule>> {
        Ok(None)
    }

    async fn list_modules(&self) -> AppResult<Vec<PermissionModule>> {
        Ok(Vec::new())
    }

    async fn insert_entry(&self, entry: CatalogEntry) -> AppResult<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn find_entry(&self, code: &PermissionCode) -> AppResult<Option<CatalogEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.code == *code)
            .cloned())
    }

    async fn list_entries(&self, _module_code: Option<&str>) -> AppResult<Vec<CatalogEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}

fn permission(code: &str) -> PermissionCode {
    PermissionCode::from_str(code).unwrap_or_else(|_| panic!("valid permission code '{code}'"))
}

fn actor() -> UserIdentity {
    UserIdentity::new(campora_core::UserId::new(), "Test Admin", None)
}

async fn service_with_catalog(
    codes: &[&str],
) -> (RoleGraphService, Arc<FakeRoleRepository>, Arc<FakeAuditRepository>) {
    let role_repository = Arc::new(FakeRoleRepository::default());
    let catalog_repository = Arc::new(FakeCatalogRepository::default());
    let audit_repository = Arc::new(FakeAuditRepository::default());

    for code in codes {
        let entry = CatalogEntry::new(permission(code), None, String::new(), false)
            .unwrap_or_else(|_| panic!("valid catalog entry '{code}'"));
        catalog_repository.entries.lock().await.push(entry);
    }

    let service = RoleGraphService::new(
        role_repository.clone(),
        catalog_repository,
        ResolutionCache::default(),
        audit_repository.clone(),
    );
    (service, role_repository, audit_repository)
}

async fn create_role(service: &RoleGraphService, code: &str) -> Role {
    service
        .create_role(CreateRoleInput {
            code: code.to_owned(),
            name: code.replace('_', " "),
            role_type: RoleType::Business,
            description: String::new(),
        })
        .await
        .unwrap_or_else(|_| panic!("role '{code}' should be created"))
}

#[tokio::test]
async fn role_by_code_finds_seeded_roles() {
    let (service, _, _) = service_with_catalog(&[]).await;
    let created = create_role(&service, "coordinador").await;

    let found = service
        .role_by_code("coordinador")
        .await
        .unwrap_or_else(|_| panic!("lookup should succeed"));
    assert_eq!(found.id, created.id);

    let missing = service.role_by_code("rector").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn effective_permissions_are_own_grants_without_parent() {
    let (service, _, _) =
        service_with_catalog(&["academic.grades.edit.own", "academic.grades.view.own"]).await;
    let teacher = create_role(&service, "teacher").await;

    for code in ["academic.grades.edit.own", "academic.grades.view.own"] {
        service
            .grant_permission(
                &actor(),
                teacher.id,
                GrantPermissionInput {
                    permission: permission(code),
                    department_filter: None,
                    is_temporary: false,
                    valid_days: None,
                },
            )
            .await
            .unwrap_or_else(|_| panic!("grant of '{code}' should succeed"));
    }

    let permissions = service
        .effective_permissions(teacher.id)
        .await
        .unwrap_or_else(|_| panic!("resolution should succeed"));

    assert_eq!(permissions.len(), 2);
    assert!(permissions.contains(&permission("academic.grades.edit.own")));
    assert!(permissions.contains(&permission("academic.grades.view.own")));
}

#[tokio::test]
async fn child_role_inherits_parent_grants() {
    let (service, _, _) = service_with_catalog(&[
        "academic.grades.edit.own",
        "academic.grades.approve.department",
    ])
    .await;
    let teacher = create_role(&service, "teacher").await;
    let department_head = create_role(&service, "department_head").await;

    service
        .grant_permission(
            &actor(),
            teacher.id,
            GrantPermissionInput {
                permission: permission("academic.grades.edit.own"),
                department_filter: None,
                is_temporary: false,
                valid_days: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("teacher grant should succeed"));
    service
        .set_parent_role(&actor(), department_head.id, Some(teacher.id))
        .await
        .unwrap_or_else(|_| panic!("parent link should be accepted"));
    service
        .grant_permission(
            &actor(),
            department_head.id,
            GrantPermissionInput {
                permission: permission("academic.grades.approve.department"),
                department_filter: None,
                is_temporary: false,
                valid_days: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("department head grant should succeed"));

    let inherited = service
        .effective_permissions(department_head.id)
        .await
        .unwrap_or_else(|_| panic!("resolution should succeed"));
    let parent_only = service
        .effective_permissions(teacher.id)
        .await
        .unwrap_or_else(|_| panic!("resolution should succeed"));

    assert!(inherited.contains(&permission("academic.grades.edit.own")));
    assert!(inherited.contains(&permission("academic.grades.approve.department")));
    assert!(inherited.is_superset(&parent_only));
    assert!(!parent_only.contains(&permission("academic.grades.approve.department")));
}

#[tokio::test]
async fn expired_temporary_grants_are_excluded() {
    let (service, role_repository, _) =
        service_with_catalog(&["academic.grades.view.department"]).await;
    let substitute = create_role(&service, "substitute_teacher").await;

    let expired = RoleGrant {
        is_temporary: true,
        valid_from: Some(Utc::now() - Duration::days(30)),
        valid_until: Some(Utc::now() - Duration::days(1)),
        ..RoleGrant::permanent(substitute.id, permission("academic.grades.view.department"))
    };
    role_repository.grants.lock().await.push(expired);

    let permissions = service
        .effective_permissions(substitute.id)
        .await
        .unwrap_or_else(|_| panic!("resolution should succeed"));

    assert!(permissions.is_empty());
}

#[tokio::test]
async fn set_parent_role_rejects_self_parent() {
    let (service, _, _) = service_with_catalog(&[]).await;
    let role = create_role(&service, "coordinator").await;

    let result = service.set_parent_role(&actor(), role.id, Some(role.id)).await;

    assert!(matches!(result, Err(AppError::CycleDetected(_))));
}

#[tokio::test]
async fn set_parent_role_rejects_two_role_cycle() {
    let (service, _, _) = service_with_catalog(&[]).await;
    let parent = create_role(&service, "coordinator").await;
    let child = create_role(&service, "teacher").await;

    service
        .set_parent_role(&actor(), child.id, Some(parent.id))
        .await
        .unwrap_or_else(|_| panic!("first parent link should be accepted"));
    let result = service.set_parent_role(&actor(), parent.id, Some(child.id)).await;

    assert!(matches!(result, Err(AppError::CycleDetected(_))));
}

#[tokio::test]
async fn resolution_surfaces_cycle_in_stored_data() {
    let (service, role_repository, _) = service_with_catalog(&[]).await;
    let first = create_role(&service, "first").await;
    let second = create_role(&service, "second").await;

    // Bypass the service guard to simulate a corrupted parent chain.
    {
        let mut roles = role_repository.roles.lock().await;
        if let Some(role) = roles.get_mut(&first.id) {
            role.parent_role = Some(second.id);
        }
        if let Some(role) = roles.get_mut(&second.id) {
            role.parent_role = Some(first.id);
        }
    }

    let result = service.effective_permissions(first.id).await;

    assert!(matches!(result, Err(AppError::CycleDetected(_))));
}

#[tokio::test]
async fn grant_permission_requires_catalog_entry() {
    let (service, _, _) = service_with_catalog(&[]).await;
    let role = create_role(&service, "teacher").await;

    let result = service
        .grant_permission(
            &actor(),
            role.id,
            GrantPermissionInput {
                permission: permission("academic.grades.edit.own"),
                department_filter: None,
                is_temporary: false,
                valid_days: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn grant_with_oversized_valid_days_is_a_validation_error() {
    let (service, _, _) = service_with_catalog(&["academic.grades.edit.own"]).await;
    let role = create_role(&service, "substitute_teacher").await;

    let result = service
        .grant_permission(
            &actor(),
            role.id,
            GrantPermissionInput {
                permission: permission("academic.grades.edit.own"),
                department_filter: None,
                is_temporary: true,
                valid_days: Some(u32::MAX),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn bulk_assign_applies_valid_codes_and_collects_failures() {
    let (service, _, audit_repository) =
        service_with_catalog(&["academic.students.view.all"]).await;
    let role = create_role(&service, "administrativo").await;

    let outcome = service
        .bulk_assign_permissions(
            &actor(),
            role.id,
            vec![
                "academic.students.view.all".to_owned(),
                "not-a-dotted-code".to_owned(),
                "academic.students.delete.all".to_owned(),
            ],
        )
        .await
        .unwrap_or_else(|_| panic!("bulk assignment should succeed"));

    assert_eq!(outcome.assigned, vec!["academic.students.view.all".to_owned()]);
    assert_eq!(outcome.failed.len(), 2);
    assert!(outcome.failed.iter().any(|failure| failure.code == "not-a-dotted-code"));
    assert!(
        outcome
            .failed
            .iter()
            .any(|failure| failure.code == "academic.students.delete.all")
    );

    let permissions = service
        .effective_permissions(role.id)
        .await
        .unwrap_or_else(|_| panic!("resolution should succeed"));
    assert!(permissions.contains(&permission("academic.students.view.all")));
    assert_eq!(audit_repository.events.lock().await.len(), 1);
}

#[tokio::test]
async fn revoking_a_grant_refreshes_resolution() {
    let (service, _, _) = service_with_catalog(&["financial.payments.approve.all"]).await;
    let role = create_role(&service, "administrativo").await;

    service
        .grant_permission(
            &actor(),
            role.id,
            GrantPermissionInput {
                permission: permission("financial.payments.approve.all"),
                department_filter: None,
                is_temporary: false,
                valid_days: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("grant should succeed"));
    assert!(
        service
            .role_has_permission(role.id, &permission("financial.payments.approve.all"))
            .await
            .unwrap_or_else(|_| panic!("membership check should succeed"))
    );

    service
        .revoke_permission(&actor(), role.id, &permission("financial.payments.approve.all"), None)
        .await
        .unwrap_or_else(|_| panic!("revocation should succeed"));

    assert!(
        !service
            .role_has_permission(role.id, &permission("financial.payments.approve.all"))
            .await
            .unwrap_or_else(|_| panic!("membership check should succeed"))
    );
}

#[tokio::test]
async fn revoking_a_missing_grant_is_not_found() {
    let (service, _, _) = service_with_catalog(&[]).await;
    let role = create_role(&service, "teacher").await;

    let result = service
        .revoke_permission(&actor(), role.id, &permission("academic.grades.edit.own"), None)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
