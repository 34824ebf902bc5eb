//! Application services and ports for permission resolution.

#![forbid(unsafe_code)]

mod assignment_ports;
mod assignment_service;
mod audit_ports;
mod catalog_ports;
mod catalog_service;
mod resolution_cache;
mod resolver_service;
mod role_graph_service;
mod role_ports;
mod template_ports;
mod template_service;

pub use assignment_ports::{AssignmentOutcome, AssignmentRepository};
pub use assignment_service::{AssignRoleInput, AssignmentService};
pub use audit_ports::{AuditEvent, AuditRepository};
pub use catalog_ports::CatalogRepository;
pub use catalog_service::{
    CatalogService, CreateModuleInput, CreatePermissionInput, SeedFailure, SeedOutcome,
};
pub use resolution_cache::{ResolutionCache, ResolutionCacheConfig};
pub use resolver_service::PermissionResolver;
pub use role_graph_service::{
    BulkGrantOutcome, CreateRoleInput, GrantFailure, GrantPermissionInput, RoleGraphService,
};
pub use role_ports::RoleRepository;
pub use template_ports::TemplateRepository;
pub use template_service::{
    AppliedEntry, BatchApplyOutcome, BatchFailure, CreateTemplateInput, TemplateService,
};
