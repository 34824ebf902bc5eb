use std::sync::Arc;

use campora_core::{AppError, AppResult};
use campora_domain::{Action, CatalogEntry, PermissionCode, PermissionModule, Scope};

use crate::CatalogRepository;

/// Input payload for creating one catalog permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Module component of the code.
    pub module_code: String,
    /// Functionality component of the code.
    pub functionality_code: String,
    /// Action component of the code.
    pub action: Action,
    /// Scope component of the code.
    pub scope: Scope,
    /// Permission name; derived from the code when omitted.
    pub name: Option<String>,
    /// Optional permission description.
    pub description: String,
    /// Whether using the permission requires an approval step.
    pub requires_approval: bool,
}

/// Input payload for module creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateModuleInput {
    /// Stable module code.
    pub code: String,
    /// Human-readable module name.
    pub name: String,
    /// Optional module description.
    pub description: String,
    /// Listing order value.
    pub sort_order: i32,
}

/// One code a bulk seeding request could not create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFailure {
    /// The dotted code that failed.
    pub code: String,
    /// Why it could not be created.
    pub error: String,
}

/// Outcome of seeding one module's permission grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedOutcome {
    /// Codes created in the catalog.
    pub created: Vec<String>,
    /// Codes that could not be created.
    pub failed: Vec<SeedFailure>,
}

/// Application service for the permission catalog: modules and the seeded
/// permission entries roles draw from.
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    /// Creates a permission module.
    pub async fn create_module(&self, input: CreateModuleInput) -> AppResult<PermissionModule> {
        let mut module = PermissionModule::new(input.code, input.name)?;
        module.description = input.description;
        module.sort_order = input.sort_order;

        if self.repository.find_module(module.code.as_str()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "module '{}' already exists",
                module.code
            )));
        }

        self.repository.insert_module(module.clone()).await?;
        Ok(module)
    }

    /// Lists all modules.
    pub async fn list_modules(&self) -> AppResult<Vec<PermissionModule>> {
        self.repository.list_modules().await
    }

    /// Creates one catalog permission. The dotted code is derived from the
    /// validated components; duplicates signal `Conflict`.
    pub async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<CatalogEntry> {
        self.module(input.module_code.as_str()).await?;

        let code = PermissionCode::new(
            input.module_code,
            input.functionality_code,
            input.action,
            input.scope,
        )?;
        if self.repository.find_entry(&code).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "permission '{code}' already exists"
            )));
        }

        let entry = CatalogEntry::new(code, input.name, input.description, input.requires_approval)?;
        self.repository.insert_entry(entry.clone()).await?;
        Ok(entry)
    }

    /// Seeds the `all`/`department`/`own` scope variants of each
    /// functionality-action pair in one module, collecting failures
    /// instead of aborting the grid. Already-present codes are skipped.
    pub async fn create_module_permissions(
        &self,
        module_code: &str,
        functionalities: Vec<(String, Vec<Action>)>,
    ) -> AppResult<SeedOutcome> {
        self.module(module_code).await?;

        let mut outcome = SeedOutcome::default();
        for (functionality, actions) in functionalities {
            for action in actions {
                for scope in [Scope::All, Scope::Department, Scope::Own] {
                    let code = match PermissionCode::new(
                        module_code,
                        functionality.as_str(),
                        action,
                        scope,
                    ) {
                        Ok(code) => code,
                        Err(error) => {
                            outcome.failed.push(SeedFailure {
                                code: format!(
                                    "{module_code}.{functionality}.{}.{}",
                                    action.as_str(),
                                    scope.as_str()
                                ),
                                error: error.to_string(),
                            });
                            continue;
                        }
                    };

                    if self.repository.find_entry(&code).await?.is_some() {
                        continue;
                    }

                    let entry = match CatalogEntry::new(code.clone(), None, String::new(), false) {
                        Ok(entry) => entry,
                        Err(error) => {
                            outcome.failed.push(SeedFailure {
                                code: code.to_string(),
                                error: error.to_string(),
                            });
                            continue;
                        }
                    };

                    match self.repository.insert_entry(entry).await {
                        Ok(()) => outcome.created.push(code.to_string()),
                        Err(error) => outcome.failed.push(SeedFailure {
                            code: code.to_string(),
                            error: error.to_string(),
                        }),
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Lists catalog entries, optionally filtered to one module.
    pub async fn list_permissions(
        &self,
        module_code: Option<&str>,
    ) -> AppResult<Vec<CatalogEntry>> {
        self.repository.list_entries(module_code).await
    }

    /// Returns one catalog entry by code.
    pub async fn permission(&self, code: &PermissionCode) -> AppResult<CatalogEntry> {
        self.repository
            .find_entry(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{code}' is not in the catalog")))
    }

    async fn module(&self, code: &str) -> AppResult<PermissionModule> {
        self.repository
            .find_module(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("module '{code}' was not found")))
    }
}

#[cfg(test)]
mod tests;
