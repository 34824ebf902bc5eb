use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use campora_core::{AppError, AppResult};
use campora_domain::{Action, CatalogEntry, PermissionCode, PermissionModule, Scope};
use tokio::sync::Mutex;

use crate::CatalogRepository;

use super::{CatalogService, CreateModuleInput, CreatePermissionInput};

#[derive(Default)]
struct FakeCatalogRepository {
    modules: Mutex<Vec<PermissionModule>>,
    entries: Mutex<Vec<CatalogEntry>>,
}

#[async_trait]
impl CatalogRepository for FakeCatalogRepository {
    async fn insert_module(&self, module: PermissionModule) -> AppResult<()> {
        self.modules.lock().await.push(module);
        Ok(())
    }

    async fn find_module(&self, code: &str) -> AppResult<Option<PermissionModule>> {
        Ok(self
            .modules
            .lock()
            .await
            .iter()
            .find(|module| module.code == code)
            .cloned())
    }

    async fn list_modules(&self) -> AppResult<Vec<PermissionModule>> {
        Ok(self.modules.lock().await.clone())
    }

    async fn insert_entry(&self, entry: CatalogEntry) -> AppResult<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn find_entry(&self, code: &PermissionCode) -> AppResult<Option<CatalogEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.code == *code)
            .cloned())
    }

    async fn list_entries(&self, module_code: Option<&str>) -> AppResult<Vec<CatalogEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|entry| module_code.is_none_or(|code| entry.code.module_code() == code))
            .cloned()
            .collect())
    }
}

fn service() -> CatalogService {
    CatalogService::new(Arc::new(FakeCatalogRepository::default()))
}

async fn seed_module(service: &CatalogService, code: &str) {
    service
        .create_module(CreateModuleInput {
            code: code.to_owned(),
            name: code.to_owned(),
            description: String::new(),
            sort_order: 0,
        })
        .await
        .unwrap_or_else(|_| panic!("module '{code}' should be created"));
}

#[tokio::test]
async fn duplicate_module_is_a_conflict() {
    let service = service();
    seed_module(&service, "academic").await;

    let result = service
        .create_module(CreateModuleInput {
            code: "academic".to_owned(),
            name: "Academic".to_owned(),
            description: String::new(),
            sort_order: 0,
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn create_permission_derives_name_and_dangerous_flag() {
    let service = service();
    seed_module(&service, "academic").await;

    let entry = service
        .create_permission(CreatePermissionInput {
            module_code: "academic".to_owned(),
            functionality_code: "grades".to_owned(),
            action: Action::Delete,
            scope: Scope::All,
            name: None,
            description: String::new(),
            requires_approval: true,
        })
        .await
        .unwrap_or_else(|_| panic!("permission should be created"));

    assert_eq!(entry.code.to_string(), "academic.grades.delete.all");
    assert_eq!(entry.name, "Academic - Grades - Delete - All");
    assert!(entry.is_dangerous);
    assert!(entry.requires_approval);
}

#[tokio::test]
async fn create_permission_requires_the_module() {
    let service = service();

    let result = service
        .create_permission(CreatePermissionInput {
            module_code: "academic".to_owned(),
            functionality_code: "grades".to_owned(),
            action: Action::View,
            scope: Scope::All,
            name: None,
            description: String::new(),
            requires_approval: false,
        })
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn duplicate_permission_is_a_conflict() {
    let service = service();
    seed_module(&service, "academic").await;

    let input = CreatePermissionInput {
        module_code: "academic".to_owned(),
        functionality_code: "grades".to_owned(),
        action: Action::View,
        scope: Scope::All,
        name: None,
        description: String::new(),
        requires_approval: false,
    };
    service
        .create_permission(input.clone())
        .await
        .unwrap_or_else(|_| panic!("permission should be created"));
    let result = service.create_permission(input).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn own_scope_cannot_require_approval() {
    let service = service();
    seed_module(&service, "academic").await;

    let result = service
        .create_permission(CreatePermissionInput {
            module_code: "academic".to_owned(),
            functionality_code: "grades".to_owned(),
            action: Action::Approve,
            scope: Scope::Own,
            name: None,
            description: String::new(),
            requires_approval: true,
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn module_seeding_creates_the_three_scope_variants() {
    let service = service();
    seed_module(&service, "academic").await;

    let outcome = service
        .create_module_permissions(
            "academic",
            vec![
                ("grades".to_owned(), vec![Action::View, Action::Edit]),
                ("courses".to_owned(), vec![Action::View]),
            ],
        )
        .await
        .unwrap_or_else(|_| panic!("seeding should succeed"));

    assert_eq!(outcome.created.len(), 9);
    assert!(outcome.failed.is_empty());
    assert!(outcome.created.contains(&"academic.grades.view.all".to_owned()));
    assert!(outcome.created.contains(&"academic.grades.edit.department".to_owned()));
    assert!(outcome.created.contains(&"academic.courses.view.own".to_owned()));
}

#[tokio::test]
async fn module_seeding_skips_existing_codes_and_collects_failures() {
    let service = service();
    seed_module(&service, "academic").await;
    service
        .create_permission(CreatePermissionInput {
            module_code: "academic".to_owned(),
            functionality_code: "grades".to_owned(),
            action: Action::View,
            scope: Scope::All,
            name: None,
            description: String::new(),
            requires_approval: false,
        })
        .await
        .unwrap_or_else(|_| panic!("permission should be created"));

    let outcome = service
        .create_module_permissions(
            "academic",
            vec![
                ("grades".to_owned(), vec![Action::View]),
                ("Bad Name".to_owned(), vec![Action::View]),
            ],
        )
        .await
        .unwrap_or_else(|_| panic!("seeding should succeed"));

    // Two fresh scope variants for grades.view; the invalid functionality
    // fails once per scope.
    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.failed.len(), 3);

    let listed = service
        .list_permissions(Some("academic"))
        .await
        .unwrap_or_else(|_| panic!("listing should succeed"));
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn listing_filters_by_module() {
    let service = service();
    seed_module(&service, "academic").await;
    seed_module(&service, "financial").await;
    service
        .create_module_permissions("academic", vec![("grades".to_owned(), vec![Action::View])])
        .await
        .unwrap_or_else(|_| panic!("seeding should succeed"));
    service
        .create_module_permissions(
            "financial",
            vec![("payments".to_owned(), vec![Action::Approve])],
        )
        .await
        .unwrap_or_else(|_| panic!("seeding should succeed"));

    let academic = service
        .list_permissions(Some("academic"))
        .await
        .unwrap_or_else(|_| panic!("listing should succeed"));
    let all = service
        .list_permissions(None)
        .await
        .unwrap_or_else(|_| panic!("listing should succeed"));

    assert_eq!(academic.len(), 3);
    assert_eq!(all.len(), 6);
    assert!(
        academic
            .iter()
            .all(|entry| entry.code.module_code() == "academic")
    );

    let looked_up = service
        .permission(
            &PermissionCode::from_str("financial.payments.approve.all")
                .unwrap_or_else(|_| panic!("valid code")),
        )
        .await
        .unwrap_or_else(|_| panic!("lookup should succeed"));
    assert!(looked_up.is_dangerous);
}
