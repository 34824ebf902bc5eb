use std::sync::Arc;

use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserId, UserIdentity};
use campora_domain::{AuditAction, RoleAssignment, window_end};
use chrono::Utc;

use crate::{
    AssignmentOutcome, AssignmentRepository, AuditEvent, AuditRepository, ResolutionCache,
    RoleRepository,
};

/// Input payload for assigning a role to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// User receiving the role.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: RoleId,
    /// Department scope; omitted for a global assignment.
    pub department: Option<DepartmentId>,
    /// Whether the assignment is time-bounded.
    pub is_temporary: bool,
    /// Validity in days for temporary assignments.
    pub valid_days: Option<u32>,
    /// Free-form assignment notes.
    pub notes: Option<String>,
}

/// Application service for the user-role assignment ledger.
#[derive(Clone)]
pub struct AssignmentService {
    repository: Arc<dyn AssignmentRepository>,
    role_repository: Arc<dyn RoleRepository>,
    cache: ResolutionCache,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AssignmentRepository>,
        role_repository: Arc<dyn RoleRepository>,
        cache: ResolutionCache,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            role_repository,
            cache,
            audit_repository,
        }
    }

    /// Assigns a role to a user, upserting on the (user, role, department)
    /// key: re-assigning refreshes the temporal fields, attribution and
    /// notes instead of duplicating the row.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        input: AssignRoleInput,
    ) -> AppResult<AssignmentOutcome> {
        let role = self
            .role_repository
            .find_role(input.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{}' was not found", input.role_id)))?;

        let now = Utc::now();
        let valid_until = match (input.is_temporary, input.valid_days) {
            (true, Some(days)) => Some(window_end(now, days)?),
            _ => None,
        };

        let assignment = RoleAssignment {
            user_id: input.user_id,
            role_id: input.role_id,
            department: input.department,
            is_temporary: input.is_temporary,
            valid_from: input.is_temporary.then_some(now),
            valid_until,
            assigned_by: Some(actor.user_id()),
            assigned_at: now,
            notes: input.notes,
        };

        let outcome = self.repository.upsert(assignment).await?;

        // Invalidate before returning so the next resolution sees the row.
        self.cache.invalidate_user(input.user_id, None);

        self.append_audit(AuditEvent {
            actor: Some(actor.user_id()),
            action: AuditAction::RoleAssigned,
            resource_type: "user_role_assignment".to_owned(),
            resource_id: format!("{}:{}", input.user_id, role.code),
            detail: Some(match input.department {
                Some(department) => {
                    format!("assigned role '{}' scoped to department '{department}'", role.code)
                }
                None => format!("assigned role '{}' globally", role.code),
            }),
        })
        .await;

        Ok(outcome)
    }

    /// Removes one ledger row.
    pub async fn remove_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: RoleId,
        department: Option<DepartmentId>,
    ) -> AppResult<()> {
        let removed = self.repository.delete(user_id, role_id, department).await?;
        if !removed {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' has no assignment for role '{role_id}'"
            )));
        }

        self.cache.invalidate_user(user_id, None);

        self.append_audit(AuditEvent {
            actor: Some(actor.user_id()),
            action: AuditAction::RoleRemoved,
            resource_type: "user_role_assignment".to_owned(),
            resource_id: format!("{user_id}:{role_id}"),
            detail: None,
        })
        .await;

        Ok(())
    }

    /// Lists ledger rows for a user. A department filter also matches
    /// department-less (global) rows.
    pub async fn assignments_for_user(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.repository.list_for_user(user_id, department).await
    }

    async fn append_audit(&self, event: AuditEvent) {
        if let Err(error) = self.audit_repository.append_event(event).await {
            tracing::warn!(%error, "audit sink unavailable, event dropped");
        }
    }
}

#[cfg(test)]
mod tests;
