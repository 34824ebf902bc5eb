use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use campora_application::{AssignmentOutcome, AssignmentRepository};
use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserId};
use campora_domain::RoleAssignment;

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for the user-role assignment ledger.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: Uuid,
    role_id: Uuid,
    department_id: Option<Uuid>,
    is_temporary: bool,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
    notes: Option<String>,
    inserted: bool,
}

impl From<AssignmentRow> for AssignmentOutcome {
    fn from(row: AssignmentRow) -> Self {
        Self {
            assignment: RoleAssignment {
                user_id: UserId::from_uuid(row.user_id),
                role_id: RoleId::from_uuid(row.role_id),
                department: row.department_id.map(DepartmentId::from_uuid),
                is_temporary: row.is_temporary,
                valid_from: row.valid_from,
                valid_until: row.valid_until,
                assigned_by: row.assigned_by.map(UserId::from_uuid),
                assigned_at: row.assigned_at,
                notes: row.notes,
            },
            created: row.inserted,
        }
    }
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    user_id: Uuid,
    role_id: Uuid,
    department_id: Option<Uuid>,
    is_temporary: bool,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
    notes: Option<String>,
}

impl From<LedgerRow> for RoleAssignment {
    fn from(row: LedgerRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            role_id: RoleId::from_uuid(row.role_id),
            department: row.department_id.map(DepartmentId::from_uuid),
            is_temporary: row.is_temporary,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            assigned_by: row.assigned_by.map(UserId::from_uuid),
            assigned_at: row.assigned_at,
            notes: row.notes,
        }
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn upsert(&self, assignment: RoleAssignment) -> AppResult<AssignmentOutcome> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO user_role_assignments (
                user_id,
                role_id,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, role_id, department_id)
            DO UPDATE SET
                is_temporary = EXCLUDED.is_temporary,
                valid_from = EXCLUDED.valid_from,
                valid_until = EXCLUDED.valid_until,
                assigned_by = EXCLUDED.assigned_by,
                assigned_at = EXCLUDED.assigned_at,
                notes = EXCLUDED.notes
            RETURNING
                user_id,
                role_id,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at,
                notes,
                (xmax = 0) AS inserted
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.department.map(|department| department.as_uuid()))
        .bind(assignment.is_temporary)
        .bind(assignment.valid_from)
        .bind(assignment.valid_until)
        .bind(assignment.assigned_by.map(|user| user.as_uuid()))
        .bind(assignment.assigned_at)
        .bind(assignment.notes.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert assignment: {error}")))?;

        Ok(AssignmentOutcome::from(row))
    }

    async fn create_if_absent(&self, assignment: RoleAssignment) -> AppResult<AssignmentOutcome> {
        let inserted = sqlx::query_as::<_, LedgerRow>(
            r#"
            INSERT INTO user_role_assignments (
                user_id,
                role_id,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, role_id, department_id) DO NOTHING
            RETURNING
                user_id,
                role_id,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at,
                notes
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.department.map(|department| department.as_uuid()))
        .bind(assignment.is_temporary)
        .bind(assignment.valid_from)
        .bind(assignment.valid_until)
        .bind(assignment.assigned_by.map(|user| user.as_uuid()))
        .bind(assignment.assigned_at)
        .bind(assignment.notes.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert assignment: {error}")))?;

        if let Some(row) = inserted {
            return Ok(AssignmentOutcome {
                assignment: RoleAssignment::from(row),
                created: true,
            });
        }

        let existing = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT
                user_id,
                role_id,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at,
                notes
            FROM user_role_assignments
            WHERE user_id = $1
                AND role_id = $2
                AND department_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.department.map(|department| department.as_uuid()))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assignment: {error}")))?;

        Ok(AssignmentOutcome {
            assignment: RoleAssignment::from(existing),
            created: false,
        })
    }

    async fn delete(
        &self,
        user_id: UserId,
        role_id: RoleId,
        department: Option<DepartmentId>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_role_assignments
            WHERE user_id = $1
                AND role_id = $2
                AND department_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(department.map(|department| department.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete assignment: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT
                user_id,
                role_id,
                department_id,
                is_temporary,
                valid_from,
                valid_until,
                assigned_by,
                assigned_at,
                notes
            FROM user_role_assignments
            WHERE user_id = $1
                AND ($2::UUID IS NULL OR department_id IS NULL OR department_id = $2)
            ORDER BY assigned_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(department.map(|department| department.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        Ok(rows.into_iter().map(RoleAssignment::from).collect())
    }
}
