//! Permission tags and the role → permission matrix
//!
//! The matrix is built once at startup and shared read-only. Roles never
//! inherit from each other and there is no wildcard tag.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use super::Role;

/// Capability tag checked at route level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    Files,
    Reports,
    SystemSettings,
    ManageUsers,
    ApproveRequests,
    SubmitRequest,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::Files,
        Permission::Reports,
        Permission::SystemSettings,
        Permission::ManageUsers,
        Permission::ApproveRequests,
        Permission::SubmitRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Files => "Files",
            Permission::Reports => "Reports",
            Permission::SystemSettings => "SystemSettings",
            Permission::ManageUsers => "ManageUsers",
            Permission::ApproveRequests => "ApproveRequests",
            Permission::SubmitRequest => "SubmitRequest",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Get a human-readable description of a permission for logging
pub fn get_permission_description(permission: Permission) -> &'static str {
    match permission {
        Permission::Files => "Access the document vault",
        Permission::Reports => "View reports",
        Permission::SystemSettings => "Change system settings",
        Permission::ManageUsers => "Manage user accounts",
        Permission::ApproveRequests => "Approve or reject access requests",
        Permission::SubmitRequest => "Submit access requests",
    }
}

static NO_PERMISSIONS: BTreeSet<Permission> = BTreeSet::new();

/// Immutable role → permission set lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMatrix {
    grants: HashMap<Role, BTreeSet<Permission>>,
}

impl PermissionMatrix {
    /// The WorkStation matrix:
    ///
    /// | Role     | Permissions                                 |
    /// |----------|---------------------------------------------|
    /// | Admin    | Files, Reports, SystemSettings, ManageUsers |
    /// | Manager  | Files, Reports, ApproveRequests             |
    /// | Employee | Files, SubmitRequest                        |
    pub fn standard() -> Self {
        use Permission::*;
        Self::from_entries([
            (Role::Admin, vec![Files, Reports, SystemSettings, ManageUsers]),
            (Role::Manager, vec![Files, Reports, ApproveRequests]),
            (Role::Employee, vec![Files, SubmitRequest]),
        ])
    }

    /// Build a matrix from explicit entries.
    ///
    /// Roles missing from `entries` get an empty set, so every role has an entry.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Role, P)>,
        P: IntoIterator<Item = Permission>,
    {
        let mut grants: HashMap<Role, BTreeSet<Permission>> =
            Role::ALL.iter().map(|r| (*r, BTreeSet::new())).collect();
        for (role, permissions) in entries {
            grants.entry(role).or_default().extend(permissions);
        }
        Self { grants }
    }

    pub fn permissions_for(&self, role: Role) -> &BTreeSet<Permission> {
        self.grants.get(&role).unwrap_or(&NO_PERMISSIONS)
    }

    /// Exact membership check
    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_permissions() {
        let m = PermissionMatrix::standard();
        assert!(m.allows(Role::Admin, Permission::Files));
        assert!(m.allows(Role::Admin, Permission::Reports));
        assert!(m.allows(Role::Admin, Permission::SystemSettings));
        assert!(m.allows(Role::Admin, Permission::ManageUsers));
        assert!(!m.allows(Role::Admin, Permission::ApproveRequests));
        assert!(!m.allows(Role::Admin, Permission::SubmitRequest));
    }

    #[test]
    fn test_manager_permissions() {
        let m = PermissionMatrix::standard();
        assert!(m.allows(Role::Manager, Permission::Files));
        assert!(m.allows(Role::Manager, Permission::Reports));
        assert!(m.allows(Role::Manager, Permission::ApproveRequests));
        assert!(!m.allows(Role::Manager, Permission::ManageUsers));
        assert!(!m.allows(Role::Manager, Permission::SystemSettings));
    }

    #[test]
    fn test_employee_permissions() {
        let m = PermissionMatrix::standard();
        assert_eq!(
            m.permissions_for(Role::Employee).iter().copied().collect::<Vec<_>>(),
            vec![Permission::Files, Permission::SubmitRequest]
        );
    }

    #[test]
    fn test_only_files_is_shared() {
        let m = PermissionMatrix::standard();
        for permission in Permission::ALL {
            let holders = Role::ALL
                .iter()
                .filter(|r| m.allows(**r, permission))
                .count();
            if permission == Permission::Files {
                assert_eq!(holders, 3);
            } else {
                assert!(holders <= 2, "{permission} held by {holders} roles");
            }
        }
    }

    #[test]
    fn test_missing_roles_get_empty_sets() {
        let m = PermissionMatrix::from_entries([(Role::Admin, vec![Permission::Files])]);
        assert!(m.permissions_for(Role::Employee).is_empty());
        assert!(!m.allows(Role::Manager, Permission::Files));
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!("ManageUsers".parse::<Permission>().unwrap(), Permission::ManageUsers);
        assert!("*".parse::<Permission>().is_err());
        assert!("files".parse::<Permission>().is_err());
    }
}
