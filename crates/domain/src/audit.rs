use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by permission mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is assigned to a user.
    RoleAssigned,
    /// Emitted when a role assignment is removed.
    RoleRemoved,
    /// Emitted when a permission is granted to a role.
    PermissionGranted,
    /// Emitted when a permission is revoked from a role.
    PermissionRevoked,
    /// Emitted when a role's parent link changes.
    RoleParentChanged,
    /// Emitted when a role template is applied to a user.
    TemplateApplied,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleAssigned => "role_assigned",
            Self::RoleRemoved => "role_removed",
            Self::PermissionGranted => "permission_granted",
            Self::PermissionRevoked => "permission_revoked",
            Self::RoleParentChanged => "role_parent_changed",
            Self::TemplateApplied => "template_applied",
        }
    }
}
