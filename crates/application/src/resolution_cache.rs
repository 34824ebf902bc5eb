use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use campora_core::{DepartmentId, RoleId, UserId};
use campora_domain::PermissionCode;
use moka::sync::Cache;

/// Cache key for one (user, department scope) resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct UserScopeKey {
    user_id: UserId,
    department: Option<DepartmentId>,
}

/// Sizing and expiry knobs for the resolution cache.
#[derive(Debug, Clone)]
pub struct ResolutionCacheConfig {
    /// Upper bound on entries per internal map.
    pub max_capacity: u64,
    /// Entry lifetime. This TTL is a safety net against missed
    /// invalidation, not the primary consistency mechanism: mutation paths
    /// invalidate synchronously before returning.
    pub time_to_live: Duration,
}

impl Default for ResolutionCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live: Duration::from_secs(300),
        }
    }
}

/// Memoizes resolver output per (user, department) pair and role-graph
/// walks per role id.
///
/// An explicit object with its own lifecycle: construct one at process
/// start and hand clones to the services that must invalidate it. Clones
/// share the underlying maps. Insert and evict are atomic single-key
/// operations, so concurrent invalidation never loses writes; a racing
/// stale read is bounded by the TTL.
#[derive(Clone)]
pub struct ResolutionCache {
    user_permissions: Cache<UserScopeKey, Arc<BTreeSet<PermissionCode>>>,
    role_permissions: Cache<RoleId, Arc<BTreeSet<PermissionCode>>>,
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResolutionCache")
            .field("user_entries", &self.user_permissions.entry_count())
            .field("role_entries", &self.role_permissions.entry_count())
            .finish()
    }
}

impl ResolutionCache {
    /// Creates a cache with the given bounds.
    #[must_use]
    pub fn new(config: ResolutionCacheConfig) -> Self {
        Self {
            user_permissions: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.time_to_live)
                .build(),
            role_permissions: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.time_to_live)
                .build(),
        }
    }

    /// Returns the memoized permission set for a (user, department) pair.
    #[must_use]
    pub fn user_permissions(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
    ) -> Option<Arc<BTreeSet<PermissionCode>>> {
        self.user_permissions.get(&UserScopeKey {
            user_id,
            department,
        })
    }

    /// Stores the resolved permission set for a (user, department) pair.
    pub fn store_user_permissions(
        &self,
        user_id: UserId,
        department: Option<DepartmentId>,
        permissions: Arc<BTreeSet<PermissionCode>>,
    ) {
        self.user_permissions.insert(
            UserScopeKey {
                user_id,
                department,
            },
            permissions,
        );
    }

    /// Returns the memoized effective permission set for a role.
    #[must_use]
    pub fn role_permissions(&self, role_id: RoleId) -> Option<Arc<BTreeSet<PermissionCode>>> {
        self.role_permissions.get(&role_id)
    }

    /// Stores the effective permission set for a role.
    pub fn store_role_permissions(
        &self,
        role_id: RoleId,
        permissions: Arc<BTreeSet<PermissionCode>>,
    ) {
        self.role_permissions.insert(role_id, permissions);
    }

    /// Removes one (user, department) entry, or every entry for the user
    /// when the department is omitted.
    pub fn invalidate_user(&self, user_id: UserId, department: Option<DepartmentId>) {
        if department.is_some() {
            self.user_permissions.invalidate(&UserScopeKey {
                user_id,
                department,
            });
            return;
        }

        // moka has no keyed scan; collect matching keys first.
        let keys: Vec<UserScopeKey> = self
            .user_permissions
            .iter()
            .filter(|(key, _)| key.user_id == user_id)
            .map(|(key, _)| *key)
            .collect();

        for key in keys {
            self.user_permissions.invalidate(&key);
        }
    }

    /// Removes one role's memoized set, or all role memoization when the
    /// role is omitted. Clearing everything is required when a parent link
    /// changes, since descendants memoize their ancestors' grants.
    pub fn invalidate_role(&self, role_id: Option<RoleId>) {
        match role_id {
            Some(role_id) => self.role_permissions.invalidate(&role_id),
            None => self.role_permissions.invalidate_all(),
        }
    }

    /// Removes every user-scoped entry.
    pub fn invalidate_all_users(&self) {
        self.user_permissions.invalidate_all();
    }

    /// Clears both internal maps.
    pub fn clear(&self) {
        self.user_permissions.invalidate_all();
        self.role_permissions.invalidate_all();
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(ResolutionCacheConfig::default())
    }
}
