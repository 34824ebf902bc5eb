use std::str::FromStr;

use campora_core::{AppError, AppResult, DepartmentId, RoleId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::PermissionCode;

/// Classification of a role's origin and purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    /// Built-in role managed by the platform.
    System,
    /// Role that models a business function.
    Business,
    /// Administrator-defined role.
    Custom,
}

impl RoleType {
    /// Returns a stable storage value for this role type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Business => "business",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for RoleType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "business" => Ok(Self::Business),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!("unknown role type '{value}'"))),
        }
    }
}

/// Role definition with optional single-parent inheritance.
///
/// The parent chain must stay acyclic; the application layer validates the
/// ancestor walk before persisting any parent change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role code.
    pub code: String,
    /// Unique human-readable role name.
    pub name: String,
    /// Role classification.
    pub role_type: RoleType,
    /// Optional role description.
    pub description: String,
    /// Soft-disable flag; inactive roles keep their assignments.
    pub is_active: bool,
    /// Marks the full-access administrative role.
    pub is_super_admin: bool,
    /// Optional parent role for permission inheritance.
    pub parent_role: Option<RoleId>,
}

impl Role {
    /// Creates an active role with a validated code and name.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        role_type: RoleType,
    ) -> AppResult<Self> {
        let code = code.into();
        let name = name.into();
        if code.trim().is_empty() {
            return Err(AppError::Validation("role code must not be empty".to_owned()));
        }
        if name.trim().is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }

        Ok(Self {
            id: RoleId::new(),
            code,
            name,
            role_type,
            description: String::new(),
            is_active: true,
            is_super_admin: false,
            parent_role: None,
        })
    }
}

/// One permission granted to a role, optionally scoped and time-bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Granting role.
    pub role_id: RoleId,
    /// Granted permission code.
    pub permission: PermissionCode,
    /// Restricts the grant's effect to one department when set.
    pub department_filter: Option<DepartmentId>,
    /// Whether the grant is time-bounded.
    pub is_temporary: bool,
    /// Start of the validity window; open when absent.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window; open when absent.
    pub valid_until: Option<DateTime<Utc>>,
    /// Administrator that created the grant.
    pub assigned_by: Option<UserId>,
    /// Creation timestamp.
    pub assigned_at: DateTime<Utc>,
}

impl RoleGrant {
    /// Creates a permanent grant with no department filter.
    #[must_use]
    pub fn permanent(role_id: RoleId, permission: PermissionCode) -> Self {
        Self {
            role_id,
            permission,
            department_filter: None,
            is_temporary: false,
            valid_from: None,
            valid_until: None,
            assigned_by: None,
            assigned_at: Utc::now(),
        }
    }

    /// Returns whether the grant is in effect at the given instant.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_temporary || window_contains(now, self.valid_from, self.valid_until)
    }
}

/// Returns whether `now` falls inside the `[from, until]` window, treating
/// open-ended bounds as unconstrained.
pub(crate) fn window_contains(
    now: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    if from.is_some_and(|from| now < from) {
        return false;
    }
    if until.is_some_and(|until| now > until) {
        return false;
    }

    true
}

/// Computes the end of a validity window `valid_days` after `now`.
///
/// Day counts that push the bound past the representable timestamp range
/// are rejected instead of overflowing.
pub fn window_end(now: DateTime<Utc>, valid_days: u32) -> AppResult<DateTime<Utc>> {
    now.checked_add_signed(Duration::days(i64::from(valid_days)))
        .ok_or_else(|| AppError::Validation(format!("valid_days '{valid_days}' is out of range")))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use campora_core::RoleId;
    use chrono::{Duration, Utc};

    use super::{Role, RoleGrant, RoleType, window_end};
    use crate::PermissionCode;

    fn grant(value: &str) -> RoleGrant {
        let permission = PermissionCode::from_str(value)
            .unwrap_or_else(|_| panic!("invalid test code '{value}'"));
        RoleGrant::permanent(RoleId::new(), permission)
    }

    #[test]
    fn role_rejects_blank_code() {
        assert!(Role::new("  ", "Teacher", RoleType::Business).is_err());
    }

    #[test]
    fn window_end_rejects_out_of_range_day_counts() {
        let now = Utc::now();
        assert!(window_end(now, 30).is_ok());
        assert!(window_end(now, u32::MAX).is_err());
    }

    #[test]
    fn permanent_grant_is_always_active() {
        let grant = grant("academic.grades.view.all");
        assert!(grant.is_active_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn expired_temporary_grant_is_inactive() {
        let now = Utc::now();
        let mut grant = grant("academic.grades.view.all");
        grant.is_temporary = true;
        grant.valid_from = Some(now - Duration::days(2));
        grant.valid_until = Some(now - Duration::hours(1));
        assert!(!grant.is_active_at(now));
    }

    #[test]
    fn open_ended_temporary_grant_is_active() {
        let now = Utc::now();
        let mut grant = grant("academic.grades.view.all");
        grant.is_temporary = true;
        grant.valid_from = Some(now - Duration::hours(1));
        assert!(grant.is_active_at(now));
    }
}
