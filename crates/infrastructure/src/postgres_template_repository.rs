use std::str::FromStr;

use async_trait::async_trait;
use uuid::Uuid;

use campora_application::TemplateRepository;
use campora_core::{AppError, AppResult, RoleId, TemplateId};
use campora_domain::{RoleTemplate, TemplateEntry, TemplateType};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for role templates.
#[derive(Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    template_type: String,
    description: String,
    is_active: bool,
}

impl TryFrom<TemplateRow> for RoleTemplate {
    type Error = AppError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let template_type =
            TemplateType::from_str(row.template_type.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode template type for template '{}': {error}",
                    row.name
                ))
            })?;

        Ok(Self {
            id: TemplateId::from_uuid(row.id),
            name: row.name,
            template_type,
            description: row.description,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    role_id: Uuid,
    is_required: bool,
    is_temporary: bool,
    valid_days: Option<i32>,
    sort_order: i32,
}

impl From<EntryRow> for TemplateEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            role_id: RoleId::from_uuid(row.role_id),
            is_required: row.is_required,
            is_temporary: row.is_temporary,
            valid_days: row.valid_days.and_then(|days| u32::try_from(days).ok()),
            sort_order: row.sort_order,
        }
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn insert_template(
        &self,
        template: RoleTemplate,
        entries: Vec<TemplateEntry>,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO role_templates (id, name, template_type, description, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(template.id.as_uuid())
        .bind(template.name.as_str())
        .bind(template.template_type.as_str())
        .bind(template.description.as_str())
        .bind(template.is_active)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "template '{}' already exists for type '{}'",
                    template.name,
                    template.template_type.as_str()
                ));
            }

            AppError::Internal(format!("failed to insert template: {error}"))
        })?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO template_roles (
                    template_id,
                    role_id,
                    is_required,
                    is_temporary,
                    valid_days,
                    sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(template.id.as_uuid())
            .bind(entry.role_id.as_uuid())
            .bind(entry.is_required)
            .bind(entry.is_temporary)
            .bind(entry.valid_days.and_then(|days| i32::try_from(days).ok()))
            .bind(entry.sort_order)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to insert template entry: {error}"))
            })?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit template: {error}")))?;

        Ok(())
    }

    async fn find_template(&self, template_id: TemplateId) -> AppResult<Option<RoleTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, name, template_type, description, is_active
            FROM role_templates
            WHERE id = $1
            "#,
        )
        .bind(template_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load template: {error}")))?;

        row.map(RoleTemplate::try_from).transpose()
    }

    async fn list_templates(&self) -> AppResult<Vec<RoleTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, name, template_type, description, is_active
            FROM role_templates
            ORDER BY template_type, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list templates: {error}")))?;

        rows.into_iter().map(RoleTemplate::try_from).collect()
    }

    async fn list_entries(&self, template_id: TemplateId) -> AppResult<Vec<TemplateEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT role_id, is_required, is_temporary, valid_days, sort_order
            FROM template_roles
            WHERE template_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(template_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list template entries: {error}")))?;

        Ok(rows.into_iter().map(TemplateEntry::from).collect())
    }
}
