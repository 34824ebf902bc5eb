use std::str::FromStr;

use async_trait::async_trait;

use campora_application::CatalogRepository;
use campora_core::{AppError, AppResult};
use campora_domain::{CatalogEntry, PermissionCode, PermissionModule};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for the permission catalog.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ModuleRow {
    code: String,
    name: String,
    description: String,
    is_active: bool,
    sort_order: i32,
}

impl From<ModuleRow> for PermissionModule {
    fn from(row: ModuleRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    permission_code: String,
    name: String,
    description: String,
    is_dangerous: bool,
    requires_approval: bool,
}

impl TryFrom<EntryRow> for CatalogEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let code = PermissionCode::from_str(row.permission_code.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode permission code '{}': {error}",
                row.permission_code
            ))
        })?;

        Ok(Self {
            code,
            name: row.name,
            description: row.description,
            is_dangerous: row.is_dangerous,
            requires_approval: row.requires_approval,
        })
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn insert_module(&self, module: PermissionModule) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_modules (code, name, description, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(module.code.as_str())
        .bind(module.name.as_str())
        .bind(module.description.as_str())
        .bind(module.is_active)
        .bind(module.sort_order)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("module '{}' already exists", module.code));
            }

            AppError::Internal(format!("failed to insert module: {error}"))
        })?;

        Ok(())
    }

    async fn find_module(&self, code: &str) -> AppResult<Option<PermissionModule>> {
        let row = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT code, name, description, is_active, sort_order
            FROM permission_modules
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load module: {error}")))?;

        Ok(row.map(PermissionModule::from))
    }

    async fn list_modules(&self) -> AppResult<Vec<PermissionModule>> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT code, name, description, is_active, sort_order
            FROM permission_modules
            ORDER BY sort_order, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list modules: {error}")))?;

        Ok(rows.into_iter().map(PermissionModule::from).collect())
    }

    async fn insert_entry(&self, entry: CatalogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_catalog (
                permission_code,
                module_code,
                functionality_code,
                action,
                scope,
                name,
                description,
                is_dangerous,
                requires_approval
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.code.to_string())
        .bind(entry.code.module_code())
        .bind(entry.code.functionality_code())
        .bind(entry.code.action().as_str())
        .bind(entry.code.scope().as_str())
        .bind(entry.name.as_str())
        .bind(entry.description.as_str())
        .bind(entry.is_dangerous)
        .bind(entry.requires_approval)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("permission '{}' already exists", entry.code));
            }

            AppError::Internal(format!("failed to insert catalog entry: {error}"))
        })?;

        Ok(())
    }

    async fn find_entry(&self, code: &PermissionCode) -> AppResult<Option<CatalogEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT permission_code, name, description, is_dangerous, requires_approval
            FROM permission_catalog
            WHERE permission_code = $1
            "#,
        )
        .bind(code.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load catalog entry: {error}")))?;

        row.map(CatalogEntry::try_from).transpose()
    }

    async fn list_entries(&self, module_code: Option<&str>) -> AppResult<Vec<CatalogEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT permission_code, name, description, is_dangerous, requires_approval
            FROM permission_catalog
            WHERE $1::TEXT IS NULL OR module_code = $1
            ORDER BY permission_code
            "#,
        )
        .bind(module_code)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list catalog entries: {error}")))?;

        rows.into_iter().map(CatalogEntry::try_from).collect()
    }
}
