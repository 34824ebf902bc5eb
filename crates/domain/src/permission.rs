use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campora_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Action component of a granular permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read access.
    View,
    /// Create new records.
    Create,
    /// Modify existing records.
    Edit,
    /// Remove records.
    Delete,
    /// Export data out of the system.
    Export,
    /// Import data into the system.
    Import,
    /// Approve a pending item.
    Approve,
    /// Reject a pending item.
    Reject,
    /// Full administrative control over a functionality.
    Manage,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Import => "import",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Manage => "manage",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::View,
            Action::Create,
            Action::Edit,
            Action::Delete,
            Action::Export,
            Action::Import,
            Action::Approve,
            Action::Reject,
            Action::Manage,
        ];

        ALL
    }

    /// Returns whether this action is destructive and must be flagged
    /// dangerous on catalog entries.
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Delete | Self::Approve | Self::Reject)
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export),
            "import" => Ok(Self::Import),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::Validation(format!("unknown action '{value}'"))),
        }
    }
}

/// Scope component of a granular permission: how broadly it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every record in the system.
    All,
    /// Records belonging to the caller's department.
    Department,
    /// Records owned by the caller only.
    Own,
    /// Caller-defined custom scoping.
    Custom,
}

impl Scope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Department => "department",
            Self::Own => "own",
            Self::Custom => "custom",
        }
    }

    /// Returns all known scopes.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Scope] = &[Scope::All, Scope::Department, Scope::Own, Scope::Custom];

        ALL
    }
}

impl FromStr for Scope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Self::All),
            "department" => Ok(Self::Department),
            "own" => Ok(Self::Own),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!("unknown scope '{value}'"))),
        }
    }
}

/// Granular permission code: `module.functionality.action.scope`.
///
/// The dotted rendering is always derived from the four components; it is
/// never authored independently, so the two can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode {
    module_code: String,
    functionality_code: String,
    action: Action,
    scope: Scope,
}

impl PermissionCode {
    /// Creates a permission code from validated components.
    pub fn new(
        module_code: impl Into<String>,
        functionality_code: impl Into<String>,
        action: Action,
        scope: Scope,
    ) -> AppResult<Self> {
        let module_code = module_code.into();
        let functionality_code = functionality_code.into();
        validate_code_component("module code", module_code.as_str())?;
        validate_code_component("functionality code", functionality_code.as_str())?;

        Ok(Self {
            module_code,
            functionality_code,
            action,
            scope,
        })
    }

    /// Returns the module component.
    #[must_use]
    pub fn module_code(&self) -> &str {
        self.module_code.as_str()
    }

    /// Returns the functionality component.
    #[must_use]
    pub fn functionality_code(&self) -> &str {
        self.functionality_code.as_str()
    }

    /// Returns the action component.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns the scope component.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}.{}.{}.{}",
            self.module_code,
            self.functionality_code,
            self.action.as_str(),
            self.scope.as_str()
        )
    }
}

impl FromStr for PermissionCode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split('.');
        let (Some(module), Some(functionality), Some(action), Some(scope), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AppError::Validation(format!(
                "permission code '{value}' must have exactly four dotted components"
            )));
        };

        Self::new(module, functionality, action.parse()?, scope.parse()?)
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionCode> for String {
    fn from(value: PermissionCode) -> Self {
        value.to_string()
    }
}

fn validate_code_component(label: &str, value: &str) -> AppResult<()> {
    let mut chars = value.chars();
    let starts_with_letter = chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase());
    let rest_is_valid = chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');

    if !starts_with_letter || !rest_is_valid {
        return Err(AppError::Validation(format!(
            "{label} '{value}' must be lowercase letters, digits or underscores and start with a letter"
        )));
    }

    Ok(())
}

/// Top-level catalog grouping for granular permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionModule {
    /// Stable module code.
    pub code: String,
    /// Human-readable module name.
    pub name: String,
    /// Optional module description.
    pub description: String,
    /// Whether the module is visible and usable.
    pub is_active: bool,
    /// Display ordering value.
    pub sort_order: i32,
}

impl PermissionModule {
    /// Creates a module with a validated code.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        let code = code.into();
        validate_code_component("module code", code.as_str())?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "module name must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            code,
            name,
            description: String::new(),
            is_active: true,
            sort_order: 0,
        })
    }
}

/// Seeded catalog entry for one granular permission code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The permission code this entry describes.
    pub code: PermissionCode,
    /// Human-readable permission name.
    pub name: String,
    /// Optional permission description.
    pub description: String,
    /// True for destructive actions; forced, never caller-chosen.
    pub is_dangerous: bool,
    /// Whether using the permission requires an approval step.
    pub requires_approval: bool,
}

impl CatalogEntry {
    /// Creates a catalog entry, deriving the name when none is given and
    /// enforcing the dangerous-action and approval invariants.
    pub fn new(
        code: PermissionCode,
        name: Option<String>,
        description: String,
        requires_approval: bool,
    ) -> AppResult<Self> {
        if requires_approval && code.scope() == Scope::Own {
            return Err(AppError::Validation(format!(
                "permission '{code}' with 'own' scope cannot require approval"
            )));
        }

        let is_dangerous = code.action().is_destructive();
        let name = match name {
            Some(name) if !name.trim().is_empty() => name,
            _ => default_entry_name(&code),
        };

        Ok(Self {
            code,
            name,
            description,
            is_dangerous,
            requires_approval,
        })
    }
}

fn default_entry_name(code: &PermissionCode) -> String {
    format!(
        "{} - {} - {} - {}",
        title_case(code.module_code()),
        title_case(code.functionality_code()),
        title_case(code.action().as_str()),
        title_case(code.scope().as_str())
    )
}

fn title_case(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{Action, CatalogEntry, PermissionCode, Scope};

    fn code(value: &str) -> PermissionCode {
        PermissionCode::from_str(value).unwrap_or_else(|_| panic!("invalid test code '{value}'"))
    }

    #[test]
    fn code_renders_all_four_components() {
        let parsed = code("academic.grades.edit.own");
        assert_eq!(parsed.module_code(), "academic");
        assert_eq!(parsed.functionality_code(), "grades");
        assert_eq!(parsed.action(), Action::Edit);
        assert_eq!(parsed.scope(), Scope::Own);
        assert_eq!(parsed.to_string(), "academic.grades.edit.own");
    }

    #[test]
    fn code_with_wrong_arity_is_rejected() {
        assert!(PermissionCode::from_str("academic.grades.edit").is_err());
        assert!(PermissionCode::from_str("academic.grades.edit.own.extra").is_err());
    }

    #[test]
    fn code_with_unknown_action_is_rejected() {
        assert!(PermissionCode::from_str("academic.grades.destroy.own").is_err());
    }

    #[test]
    fn component_must_start_with_letter() {
        assert!(PermissionCode::from_str("1academic.grades.view.all").is_err());
        assert!(PermissionCode::from_str("academic.2grades.view.all").is_err());
    }

    #[test]
    fn uppercase_component_is_rejected() {
        assert!(PermissionCode::from_str("Academic.grades.view.all").is_err());
    }

    #[test]
    fn destructive_action_forces_dangerous_flag() {
        let entry = CatalogEntry::new(code("academic.grades.delete.all"), None, String::new(), false);
        assert!(entry.is_ok());
        let entry = entry.unwrap_or_else(|_| unreachable!());
        assert!(entry.is_dangerous);
    }

    #[test]
    fn own_scope_cannot_require_approval() {
        let entry = CatalogEntry::new(code("academic.grades.edit.own"), None, String::new(), true);
        assert!(entry.is_err());
    }

    #[test]
    fn entry_name_is_derived_when_missing() {
        let entry = CatalogEntry::new(
            code("academic.student_records.view.all"),
            None,
            String::new(),
            false,
        );
        assert!(entry.is_ok());
        let entry = entry.unwrap_or_else(|_| unreachable!());
        assert_eq!(entry.name, "Academic - Student Records - View - All");
    }

    proptest! {
        #[test]
        fn valid_codes_roundtrip_through_display(
            module in "[a-z][a-z0-9_]{0,15}",
            functionality in "[a-z][a-z0-9_]{0,15}",
            action_index in 0usize..9,
            scope_index in 0usize..4,
        ) {
            let action = Action::all()[action_index];
            let scope = Scope::all()[scope_index];
            let built = PermissionCode::new(module, functionality, action, scope);
            prop_assert!(built.is_ok());
            let built = built.unwrap_or_else(|_| unreachable!());
            let reparsed = PermissionCode::from_str(built.to_string().as_str());
            prop_assert!(reparsed.is_ok());
            prop_assert_eq!(reparsed.unwrap_or_else(|_| unreachable!()), built);
        }
    }
}
