use campora_application::{
    AssignmentService, CatalogService, PermissionResolver, RoleGraphService, TemplateService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: CatalogService,
    pub role_service: RoleGraphService,
    pub assignment_service: AssignmentService,
    pub template_service: TemplateService,
    pub resolver: PermissionResolver,
    pub api_token: String,
}
