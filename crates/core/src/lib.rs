//! Shared primitives for all Rust crates in Campora.

#![forbid(unsafe_code)]

/// Authenticated identity primitives shared across services.
pub mod identity;
/// Identifier newtypes for persisted and externally owned entities.
pub mod ids;

use thiserror::Error;

pub use identity::UserIdentity;
pub use ids::{DepartmentId, RoleId, TemplateId, UserId};

/// Result type used across Campora crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Role parent chain is, or would become, cyclic.
    #[error("role cycle detected: {0}")]
    CycleDetected(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
