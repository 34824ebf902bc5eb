use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserIdentity};
use campora_domain::{AuditAction, PermissionCode, Role, RoleGrant, RoleType, window_end};
use chrono::Utc;

use crate::{AuditEvent, AuditRepository, CatalogRepository, ResolutionCache, RoleRepository};

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role code.
    pub code: String,
    /// Unique role name.
    pub name: String,
    /// Role classification.
    pub role_type: RoleType,
    /// Optional role description.
    pub description: String,
}

/// Input payload for granting one permission to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPermissionInput {
    /// Permission code to grant.
    pub permission: PermissionCode,
    /// Restricts the grant's effect to one department when set.
    pub department_filter: Option<DepartmentId>,
    /// Whether the grant is time-bounded.
    pub is_temporary: bool,
    /// Validity in days for temporary grants.
    pub valid_days: Option<u32>,
}

/// One unresolvable code from a bulk grant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantFailure {
    /// The dotted code as submitted.
    pub code: String,
    /// Why it could not be granted.
    pub error: String,
}

/// Outcome of a bulk permission grant: valid codes are applied even when
/// others fail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkGrantOutcome {
    /// Codes granted to the role.
    pub assigned: Vec<String>,
    /// Codes that could not be granted.
    pub failed: Vec<GrantFailure>,
}

/// Application service for the role graph: role definitions, parent
/// inheritance and permission grants.
#[derive(Clone)]
pub struct RoleGraphService {
    repository: Arc<dyn RoleRepository>,
    catalog_repository: Arc<dyn CatalogRepository>,
    cache: ResolutionCache,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleGraphService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
        cache: ResolutionCache,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            catalog_repository,
            cache,
            audit_repository,
        }
    }

    /// Creates a role with no parent and no grants.
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let mut role = Role::new(input.code, input.name, input.role_type)?;
        role.description = input.description;
        self.repository.insert_role(role.clone()).await?;
        Ok(role)
    }

    /// Returns a role by id.
    pub async fn role(&self, role_id: RoleId) -> AppResult<Role> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Returns a role by its unique code.
    pub async fn role_by_code(&self, code: &str) -> AppResult<Role> {
        self.repository
            .find_role_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{code}' was not found")))
    }

    /// Lists all roles.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Computes the role's full permission set including inherited grants.
    ///
    /// The parent chain is walked iteratively with a visited set, so a
    /// cyclic chain in stored data surfaces as `CycleDetected` instead of
    /// hanging resolution. Grants outside their validity window are
    /// excluded; the per-role memo expires with the cache TTL.
    pub async fn effective_permissions(
        &self,
        role_id: RoleId,
    ) -> AppResult<BTreeSet<PermissionCode>> {
        if let Some(memoized) = self.cache.role_permissions(role_id) {
            return Ok((*memoized).clone());
        }

        let now = Utc::now();
        let mut permissions = BTreeSet::new();
        let mut visited: HashSet<RoleId> = HashSet::new();
        let mut current = Some(role_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(AppError::CycleDetected(format!(
                    "role '{id}' appears twice in the parent chain of role '{role_id}'"
                )));
            }

            // An ancestor memo already contains the rest of the chain.
            if id != role_id {
                if let Some(memoized) = self.cache.role_permissions(id) {
                    permissions.extend(memoized.iter().cloned());
                    break;
                }
            }

            let role = self
                .repository
                .find_role(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("role '{id}' was not found")))?;

            for grant in self.repository.list_grants(id).await? {
                if grant.is_active_at(now) {
                    permissions.insert(grant.permission);
                }
            }

            current = role.parent_role;
        }

        self.cache
            .store_role_permissions(role_id, Arc::new(permissions.clone()));

        Ok(permissions)
    }

    /// Membership test over `effective_permissions`.
    pub async fn role_has_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionCode,
    ) -> AppResult<bool> {
        Ok(self.effective_permissions(role_id).await?.contains(permission))
    }

    /// Changes a role's parent link, rejecting any link that would make
    /// the chain cyclic before persisting it.
    pub async fn set_parent_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        parent: Option<RoleId>,
    ) -> AppResult<()> {
        let role = self.role(role_id).await?;

        if let Some(parent_id) = parent {
            self.ensure_acyclic(role_id, parent_id).await?;
        }

        self.repository.set_parent_role(role_id, parent).await?;

        // A parent change reshapes every descendant's effective set.
        self.cache.invalidate_role(None);
        self.cache.invalidate_all_users();

        self.append_audit(AuditEvent {
            actor: Some(actor.user_id()),
            action: AuditAction::RoleParentChanged,
            resource_type: "role".to_owned(),
            resource_id: role.code.clone(),
            detail: Some(match parent {
                Some(parent_id) => format!("role '{}' now inherits from '{parent_id}'", role.code),
                None => format!("role '{}' no longer inherits", role.code),
            }),
        })
        .await;

        Ok(())
    }

    /// Grants one catalog permission to a role, upserting on the
    /// (role, permission, department) key.
    pub async fn grant_permission(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        input: GrantPermissionInput,
    ) -> AppResult<RoleGrant> {
        let role = self.role(role_id).await?;

        self.catalog_repository
            .find_entry(&input.permission)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "permission '{}' is not in the catalog",
                    input.permission
                ))
            })?;

        let now = Utc::now();
        let valid_until = match (input.is_temporary, input.valid_days) {
            (true, Some(days)) => Some(window_end(now, days)?),
            _ => None,
        };

        let grant = RoleGrant {
            role_id,
            permission: input.permission.clone(),
            department_filter: input.department_filter,
            is_temporary: input.is_temporary,
            valid_from: input.is_temporary.then_some(now),
            valid_until,
            assigned_by: Some(actor.user_id()),
            assigned_at: now,
        };

        self.repository.upsert_grant(grant.clone()).await?;
        self.invalidate_after_grant_change();

        self.append_audit(AuditEvent {
            actor: Some(actor.user_id()),
            action: AuditAction::PermissionGranted,
            resource_type: "role_grant".to_owned(),
            resource_id: format!("{}:{}", role.code, input.permission),
            detail: None,
        })
        .await;

        Ok(grant)
    }

    /// Revokes one grant from a role.
    pub async fn revoke_permission(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permission: &PermissionCode,
        department_filter: Option<DepartmentId>,
    ) -> AppResult<()> {
        let role = self.role(role_id).await?;

        let removed = self
            .repository
            .delete_grant(role_id, permission, department_filter)
            .await?;
        if !removed {
            return Err(AppError::NotFound(format!(
                "role '{}' has no grant for '{permission}'",
                role.code
            )));
        }

        self.invalidate_after_grant_change();

        self.append_audit(AuditEvent {
            actor: Some(actor.user_id()),
            action: AuditAction::PermissionRevoked,
            resource_type: "role_grant".to_owned(),
            resource_id: format!("{}:{permission}", role.code),
            detail: None,
        })
        .await;

        Ok(())
    }

    /// Grants a list of dotted codes to a role, collecting unresolvable
    /// codes instead of aborting the valid assignments.
    pub async fn bulk_assign_permissions(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        codes: Vec<String>,
    ) -> AppResult<BulkGrantOutcome> {
        let role = self.role(role_id).await?;
        let mut outcome = BulkGrantOutcome::default();

        for raw_code in codes {
            let permission = match PermissionCode::from_str(raw_code.as_str()) {
                Ok(permission) => permission,
                Err(error) => {
                    outcome.failed.push(GrantFailure {
                        code: raw_code,
                        error: error.to_string(),
                    });
                    continue;
                }
            };

            match self.catalog_repository.find_entry(&permission).await? {
                Some(_) => {}
                None => {
                    outcome.failed.push(GrantFailure {
                        code: raw_code,
                        error: format!("permission '{permission}' is not in the catalog"),
                    });
                    continue;
                }
            }

            let grant = RoleGrant {
                assigned_by: Some(actor.user_id()),
                ..RoleGrant::permanent(role_id, permission)
            };

            match self.repository.upsert_grant(grant).await {
                Ok(()) => outcome.assigned.push(raw_code),
                Err(error) => outcome.failed.push(GrantFailure {
                    code: raw_code,
                    error: error.to_string(),
                }),
            }
        }

        if !outcome.assigned.is_empty() {
            self.invalidate_after_grant_change();

            self.append_audit(AuditEvent {
                actor: Some(actor.user_id()),
                action: AuditAction::PermissionGranted,
                resource_type: "role_grant".to_owned(),
                resource_id: role.code.clone(),
                detail: Some(format!(
                    "bulk granted {} permission(s): {}",
                    outcome.assigned.len(),
                    outcome.assigned.join(", ")
                )),
            })
            .await;
        }

        Ok(outcome)
    }

    /// Walks the would-be ancestor chain and rejects a link that reaches
    /// back to the role being re-parented.
    async fn ensure_acyclic(&self, role_id: RoleId, parent_id: RoleId) -> AppResult<()> {
        if parent_id == role_id {
            return Err(AppError::CycleDetected(format!(
                "role '{role_id}' cannot be its own parent"
            )));
        }

        let mut visited: HashSet<RoleId> = HashSet::new();
        let mut current = Some(parent_id);

        while let Some(ancestor_id) = current {
            if ancestor_id == role_id {
                return Err(AppError::CycleDetected(format!(
                    "role '{role_id}' is an ancestor of its proposed parent '{parent_id}'"
                )));
            }
            if !visited.insert(ancestor_id) {
                return Err(AppError::CycleDetected(format!(
                    "parent chain of role '{parent_id}' is already cyclic"
                )));
            }

            current = self
                .repository
                .find_role(ancestor_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("role '{ancestor_id}' was not found"))
                })?
                .parent_role;
        }

        Ok(())
    }

    fn invalidate_after_grant_change(&self) {
        // Child roles memoize this role's grants inside their own entries,
        // and user entries union them; both memo layers go.
        self.cache.invalidate_role(None);
        self.cache.invalidate_all_users();
    }

    async fn append_audit(&self, event: AuditEvent) {
        if let Err(error) = self.audit_repository.append_event(event).await {
            tracing::warn!(%error, "audit sink unavailable, event dropped");
        }
    }
}

#[cfg(test)]
mod tests;
