//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_catalog_repository;
mod postgres_role_repository;
mod postgres_template_repository;

pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_template_repository::PostgresTemplateRepository;
