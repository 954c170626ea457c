//! Roles and the registration-time role rule
//!
//! The rule is a naive substring match over the identity string. It is a
//! classroom stand-in, not an allow-listed domain mapping: anyone who picks an
//! email containing "admin" registers as Admin.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by a principal. Exactly one per principal, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Manager" => Ok(Role::Manager),
            "Employee" => Ok(Role::Employee),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Ordered (substring, role) rules, evaluated top to bottom against the
/// lowercased identity. First match wins.
pub const ROLE_RULES: &[(&str, Role)] = &[("admin", Role::Admin), ("manager", Role::Manager)];

/// Role assigned when no rule matches
pub const FALLBACK_ROLE: Role = Role::Employee;

/// Derive the role for a new registration from its identity
pub fn derive_role(identity: &str) -> Role {
    let lowered = identity.to_lowercase();
    ROLE_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, role)| *role)
        .unwrap_or(FALLBACK_ROLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identities_are_employees() {
        assert_eq!(derive_role("jane@corp.example"), Role::Employee);
        assert_eq!(derive_role("ops-team@corp.example"), Role::Employee);
        assert_eq!(derive_role(""), Role::Employee);
    }

    #[test]
    fn test_substring_matches() {
        assert_eq!(derive_role("admin@corp.example"), Role::Admin);
        assert_eq!(derive_role("sysadmin.bob@corp.example"), Role::Admin);
        assert_eq!(derive_role("manager.sue@corp.example"), Role::Manager);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(derive_role("ADMIN@CORP.EXAMPLE"), Role::Admin);
        assert_eq!(derive_role("Team.Manager@corp.example"), Role::Manager);
    }

    #[test]
    fn test_admin_wins_over_manager() {
        assert_eq!(derive_role("manager-admin@corp.example"), Role::Admin);
        assert_eq!(derive_role("admin.manager@corp.example"), Role::Admin);
    }

    #[test]
    fn test_role_string_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }
}
