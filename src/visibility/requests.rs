//! Which access requests a principal may list

use crate::auth::Role;
use crate::db::AccessRequestRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Only requests filed by this principal id
    Own(u64),
    All,
}

impl RequestScope {
    pub fn includes(&self, request: &AccessRequestRecord) -> bool {
        match self {
            Self::Own(id) => request.requester_id == *id,
            Self::All => true,
        }
    }
}

/// Employees list their own requests. Managers and Admins list everyone's.
pub fn request_scope(role: Role, principal_id: u64) -> RequestScope {
    match role {
        Role::Employee => RequestScope::Own(principal_id),
        Role::Manager | Role::Admin => RequestScope::All,
    }
}
