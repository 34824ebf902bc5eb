use std::str::FromStr;

use campora_core::{AppError, AppResult, RoleId, TemplateId};
use serde::{Deserialize, Serialize};

/// Business vertical a role template is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    /// Academic institutions.
    University,
    /// Healthcare organizations.
    Hospital,
    /// Online commerce operations.
    Ecommerce,
    /// Project-driven organizations.
    Project,
    /// Administrator-defined bundle.
    Custom,
}

impl TemplateType {
    /// Returns a stable storage value for this template type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::University => "university",
            Self::Hospital => "hospital",
            Self::Ecommerce => "ecommerce",
            Self::Project => "project",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for TemplateType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "university" => Ok(Self::University),
            "hospital" => Ok(Self::Hospital),
            "ecommerce" => Ok(Self::Ecommerce),
            "project" => Ok(Self::Project),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!(
                "unknown template type '{value}'"
            ))),
        }
    }
}

/// Named bundle of roles applied together as an onboarding shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTemplate {
    /// Stable template identifier.
    pub id: TemplateId,
    /// Template name, unique per template type.
    pub name: String,
    /// Business vertical classification.
    pub template_type: TemplateType,
    /// Optional template description.
    pub description: String,
    /// Whether the template may still be applied.
    pub is_active: bool,
}

impl RoleTemplate {
    /// Creates an active template with a validated name.
    pub fn new(name: impl Into<String>, template_type: TemplateType) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "template name must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            id: TemplateId::new(),
            name,
            template_type,
            description: String::new(),
            is_active: true,
        })
    }
}

/// One role entry inside a template bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Role applied by this entry.
    pub role_id: RoleId,
    /// Whether application of this entry is mandatory.
    pub is_required: bool,
    /// Whether the produced assignment is time-bounded.
    pub is_temporary: bool,
    /// Validity in days for temporary entries.
    pub valid_days: Option<u32>,
    /// Application ordering value.
    pub sort_order: i32,
}

impl TemplateEntry {
    /// Creates a required, permanent entry.
    #[must_use]
    pub fn required(role_id: RoleId) -> Self {
        Self {
            role_id,
            is_required: true,
            is_temporary: false,
            valid_days: None,
            sort_order: 0,
        }
    }
}
