use async_trait::async_trait;
use campora_core::AppResult;
use campora_domain::{CatalogEntry, PermissionCode, PermissionModule};

/// Repository port for the seeded permission catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persists a permission module; duplicate codes signal `Conflict`.
    async fn insert_module(&self, module: PermissionModule) -> AppResult<()>;

    /// Finds a module by its stable code.
    async fn find_module(&self, code: &str) -> AppResult<Option<PermissionModule>>;

    /// Lists all modules ordered by sort order and name.
    async fn list_modules(&self) -> AppResult<Vec<PermissionModule>>;

    /// Persists a catalog entry; duplicate codes signal `Conflict`.
    async fn insert_entry(&self, entry: CatalogEntry) -> AppResult<()>;

    /// Finds a catalog entry by its permission code.
    async fn find_entry(&self, code: &PermissionCode) -> AppResult<Option<CatalogEntry>>;

    /// Lists catalog entries, optionally filtered to one module.
    async fn list_entries(&self, module_code: Option<&str>) -> AppResult<Vec<CatalogEntry>>;
}
