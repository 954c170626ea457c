//! Which work assignments a principal may list, and who may hand them out

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Row fields the scope reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentParties {
    pub assigned_to: u64,
    pub assigned_by: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentScope {
    /// Work handed to this principal id
    AssignedTo(u64),
    /// Work handed out by this principal id
    AssignedBy(u64),
}

impl AssignmentScope {
    pub fn includes(&self, parties: &AssignmentParties) -> bool {
        match self {
            Self::AssignedTo(id) => parties.assigned_to == *id,
            Self::AssignedBy(id) => parties.assigned_by == *id,
        }
    }
}

/// Employees see work assigned to them. Managers and Admins see only what
/// they assigned, never each other's.
pub fn assignment_scope(role: Role, principal_id: u64) -> AssignmentScope {
    match role {
        Role::Employee => AssignmentScope::AssignedTo(principal_id),
        Role::Manager | Role::Admin => AssignmentScope::AssignedBy(principal_id),
    }
}

/// Role check for handing out work and reading the team roster.
///
/// Not a matrix permission: the matrix has no tag for it.
pub fn can_assign(role: Role) -> bool {
    matches!(role, Role::Manager | Role::Admin)
}
