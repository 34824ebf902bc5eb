use campora_core::{DepartmentId, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::window_contains;

/// Ledger row associating a user with a role, optionally scoped to one
/// department and optionally time-bounded.
///
/// Rows are unique per `(user, role, department)`. Validity is always
/// derived from the stored bounds at read time; expired rows stay in the
/// ledger as history and are excluded from resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Department scope; a row without one applies globally.
    pub department: Option<DepartmentId>,
    /// Whether the assignment is time-bounded.
    pub is_temporary: bool,
    /// Start of the validity window; open when absent.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window; open when absent.
    pub valid_until: Option<DateTime<Utc>>,
    /// Administrator that created the assignment.
    pub assigned_by: Option<UserId>,
    /// Creation timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Free-form assignment notes.
    pub notes: Option<String>,
}

impl RoleAssignment {
    /// Creates a permanent, department-less assignment.
    #[must_use]
    pub fn permanent(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            user_id,
            role_id,
            department: None,
            is_temporary: false,
            valid_from: None,
            valid_until: None,
            assigned_by: None,
            assigned_at: Utc::now(),
            notes: None,
        }
    }

    /// Returns whether the assignment is in effect at the given instant.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_temporary || window_contains(now, self.valid_from, self.valid_until)
    }
}
