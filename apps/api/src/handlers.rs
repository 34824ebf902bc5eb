//! HTTP handlers grouped by resource.

pub mod assignments;
pub mod catalog;
pub mod health;
pub mod resolution;
pub mod roles;
pub mod templates;
