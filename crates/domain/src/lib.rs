//! Domain entities and invariants for the Campora permission core.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod permission;
mod role;
mod template;

pub use assignment::RoleAssignment;
pub use audit::AuditAction;
pub use permission::{Action, CatalogEntry, PermissionCode, PermissionModule, Scope};
pub use role::{Role, RoleGrant, RoleType, window_end};
pub use template::{RoleTemplate, TemplateEntry, TemplateType};
