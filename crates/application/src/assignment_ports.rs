use async_trait::async_trait;
use campora_core::{AppResult, DepartmentId, RoleId, UserId};
use campora_domain::RoleAssignment;

/// Result of writing one ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOutcome {
    /// The stored assignment after the write.
    pub assignment: RoleAssignment,
    /// Whether a new row was created (false for upsert-update and
    /// get-or-create hits).
    pub created: bool,
}

/// Repository port for the user-role assignment ledger.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Upserts a row keyed by (user, role, department): an existing row
    /// has its temporal fields, `assigned_by` and `notes` replaced.
    async fn upsert(&self, assignment: RoleAssignment) -> AppResult<AssignmentOutcome>;

    /// Inserts a row only when the (user, role, department) key is absent;
    /// an existing row is returned untouched.
    async fn create_if_absent(&self, assignment: RoleAssignment) -> AppResult<AssignmentOutcome>;

    /// Deletes a row; returns whether one was removed.
    async fn delete(
        &self,
        user_id: UserId,
        role_id: RoleId,
        department: Option<DepartmentId>,
    ) -> AppResult<bool>;

    /// Lists ledger rows for a user. A department filter matches rows with
    /// that department OR rows with no department (global rows).
    async fn list_for_user(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<RoleAssignment>>;
}
