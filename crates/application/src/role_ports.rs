use async_trait::async_trait;
use campora_core::{AppResult, DepartmentId, RoleId};
use campora_domain::{PermissionCode, Role, RoleGrant};

/// Repository port for roles and their permission grants.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a role; duplicate code or name signals `Conflict`.
    async fn insert_role(&self, role: Role) -> AppResult<()>;

    /// Finds a role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its unique code.
    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>>;

    /// Lists all roles ordered by type and name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Updates a role's parent link. The caller is responsible for the
    /// acyclicity check; this only persists the change.
    async fn set_parent_role(&self, role_id: RoleId, parent: Option<RoleId>) -> AppResult<()>;

    /// Lists the role's own grants (inheritance excluded).
    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<RoleGrant>>;

    /// Inserts or updates a grant keyed by (role, permission, department).
    async fn upsert_grant(&self, grant: RoleGrant) -> AppResult<()>;

    /// Deletes a grant; returns whether a row was removed.
    async fn delete_grant(
        &self,
        role_id: RoleId,
        permission: &PermissionCode,
        department_filter: Option<DepartmentId>,
    ) -> AppResult<bool>;
}
