use std::collections::BTreeSet;
use std::sync::Arc;

use campora_core::{AppResult, DepartmentId, UserId};
use campora_domain::{PermissionCode, RoleAssignment};
use chrono::Utc;

use crate::{AssignmentRepository, ResolutionCache, RoleGraphService};

/// Resolves a user's effective permission set from the assignment ledger
/// and the role graph.
#[derive(Clone)]
pub struct PermissionResolver {
    assignment_repository: Arc<dyn AssignmentRepository>,
    role_graph: RoleGraphService,
    cache: ResolutionCache,
}

impl PermissionResolver {
    /// Creates a new resolver. The cache must be the same instance the
    /// mutation services invalidate, or resolutions go stale.
    #[must_use]
    pub fn new(
        assignment_repository: Arc<dyn AssignmentRepository>,
        role_graph: RoleGraphService,
        cache: ResolutionCache,
    ) -> Self {
        Self {
            assignment_repository,
            role_graph,
            cache,
        }
    }

    /// Computes the union of effective permissions over the user's active
    /// assignments, serving from cache when possible. A user with no
    /// active assignments resolves to the empty set.
    pub async fn resolve_permissions(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<BTreeSet<PermissionCode>> {
        if let Some(cached) = self.cache.user_permissions(user_id, department) {
            return Ok((*cached).clone());
        }

        let mut permissions = BTreeSet::new();
        for assignment in self.active_assignments(user_id, department).await? {
            permissions.extend(
                self.role_graph
                    .effective_permissions(assignment.role_id)
                    .await?,
            );
        }

        self.cache
            .store_user_permissions(user_id, department, Arc::new(permissions.clone()));

        Ok(permissions)
    }

    /// Returns whether the user holds the permission. Serves from the
    /// cached set when present; on a miss it checks role by role and
    /// stops at the first hit instead of materializing the full union.
    /// A missing permission is `Ok(false)`, never an error.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission: &PermissionCode,
        department: Option<DepartmentId>,
    ) -> AppResult<bool> {
        if let Some(cached) = self.cache.user_permissions(user_id, department) {
            return Ok(cached.contains(permission));
        }

        for assignment in self.active_assignments(user_id, department).await? {
            if self
                .role_graph
                .role_has_permission(assignment.role_id, permission)
                .await?
            {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn active_assignments(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let now = Utc::now();
        Ok(self
            .assignment_repository
            .list_for_user(user_id, department)
            .await?
            .into_iter()
            .filter(|assignment| assignment.is_active_at(now))
            .collect())
    }
}
