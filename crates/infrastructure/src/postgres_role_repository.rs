use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use campora_application::RoleRepository;
use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserId};
use campora_domain::{PermissionCode, Role, RoleGrant, RoleType};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for the role graph.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    code: String,
    name: String,
    role_type: String,
    description: String,
    is_active: bool,
    is_super_admin: bool,
    parent_role_id: Option<Uuid>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let role_type = RoleType::from_str(row.role_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode role type for role '{}': {error}",
                row.code
            ))
        })?;

        Ok(Self {
            id: RoleId::from_uuid(row.id),
            code: row.code,
            name: row.name,
            role_type,
            description: row.description,
            is_active: row.is_active,
            is_super_admin: row.is_super_admin,
            parent_role: row.parent_role_id.map(RoleId::from_uuid),
        })
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    role_id: Uuid,
    permission_code: String,
    department_id: Option<Uuid>,
    is_temporary: bool,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for RoleGrant {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let permission =
            PermissionCode::from_str(row.permission_code.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode permission code '{}': {error}",
                    row.permission_code
                ))
            })?;

        Ok(Self {
            role_id: RoleId::from_uuid(row.role_id),
            permission,
            department_filter: row.department_id.map(DepartmentId::from_uuid),
            is_temporary: row.is_temporary,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            assigned_by: row.assigned_by.map(UserId::from_uuid),
            assigned_at: row.assigned_at,
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (
                id,
                code,
                name,
                role_type,
                description,
                is_active,
                is_super_admin,
                parent_role_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(role.code.as_str())
        .bind(role.name.as_str())
        .bind(role.role_type.as_str())
        .bind(role.description.as_str())
        .bind(role.is_active)
        .bind(role.is_super_admin)
        .bind(role.parent_role.map(|parent| parent.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "role code '{}' or name '{}' already exists",
                    role.code, role.name
                ));
            }

            AppError::Internal(format!("failed to insert role: {error}"))
        })?;

        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id,
                code,
                name,
                role_type,
                description,
                is_active,
                is_super_admin,
                parent_role_id
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id,
                code,
                name,
                role_type,
                description,
                is_active,
                is_super_admin,
                parent_role_id
            FROM roles
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id,
                code,
                name,
                role_type,
                description,
                is_active,
                is_super_admin,
                parent_role_id
            FROM roles
            ORDER BY role_type, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn set_parent_role(&self, role_id: RoleId, parent: Option<RoleId>) -> AppResult<()> {
        let result = sqlx::query("UPDATE roles SET parent_role_id = $2 WHERE id = $1")
            .bind(role_id.as_uuid())
            .bind(parent.map(|parent| parent.as_uuid()))
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to update parent role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }

    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                role_id,
                permission_code,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at
            FROM role_grants
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role grants: {error}")))?;

        rows.into_iter().map(RoleGrant::try_from).collect()
    }

    async fn upsert_grant(&self, grant: RoleGrant) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_grants (
                role_id,
                permission_code,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (role_id, permission_code, department_id)
            DO UPDATE SET
                is_temporary = EXCLUDED.is_temporary,
                valid_from = EXCLUDED.valid_from,
                valid_until = EXCLUDED.valid_until,
                assigned_by = EXCLUDED.assigned_by,
                assigned_at = EXCLUDED.assigned_at
            "#,
        )
        .bind(grant.role_id.as_uuid())
        .bind(grant.permission.to_string())
        .bind(grant.department_filter.map(|department| department.as_uuid()))
        .bind(grant.is_temporary)
        .bind(grant.valid_from)
        .bind(grant.valid_until)
        .bind(grant.assigned_by.map(|user| user.as_uuid()))
        .bind(grant.assigned_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert role grant: {error}")))?;

        Ok(())
    }

    async fn delete_grant(
        &self,
        role_id: RoleId,
        permission: &PermissionCode,
        department_filter: Option<DepartmentId>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_grants
            WHERE role_id = $1
                AND permission_code = $2
                AND department_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission.to_string())
        .bind(department_filter.map(|department| department.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role grant: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
