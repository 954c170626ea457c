//! Message addressing and read visibility
//!
//! Group messages are resolved against the reader's role at read time. No
//! per-recipient copies are written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::Role;
use crate::types::AuthError;

/// Recipient role-group tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleGroup {
    AllAdmins,
    AllManagers,
    AllEmployees,
    /// Every principal
    All,
}

impl RoleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllAdmins => "all_admins",
            Self::AllManagers => "all_managers",
            Self::AllEmployees => "all_employees",
            Self::All => "all",
        }
    }

    /// Whether members of `role` belong to this group
    pub fn includes(&self, role: Role) -> bool {
        match self {
            Self::AllAdmins => role == Role::Admin,
            Self::AllManagers => role == Role::Manager,
            Self::AllEmployees => role == Role::Employee,
            Self::All => true,
        }
    }
}

impl fmt::Display for RoleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleGroup {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_admins" => Ok(Self::AllAdmins),
            "all_managers" => Ok(Self::AllManagers),
            "all_employees" => Ok(Self::AllEmployees),
            "all" => Ok(Self::All),
            other => Err(AddressError::UnknownGroup(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Message must have a recipient or a recipient group")]
    Missing,

    #[error("Message cannot have both a recipient and a recipient group")]
    Ambiguous,

    #[error("Unknown recipient group: {0}")]
    UnknownGroup(String),
}

impl From<AddressError> for AuthError {
    fn from(err: AddressError) -> Self {
        AuthError::BadRequest(err.to_string())
    }
}

/// Exactly one recipient specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAddress {
    /// One principal, by id
    Direct(u64),
    Group(RoleGroup),
}

impl MessageAddress {
    /// Build from the nullable column pair used on the wire and in SQL
    pub fn from_parts(
        recipient_id: Option<u64>,
        recipient_group: Option<&str>,
    ) -> Result<Self, AddressError> {
        match (recipient_id, recipient_group.filter(|g| !g.is_empty())) {
            (Some(id), None) => Ok(Self::Direct(id)),
            (None, Some(group)) => Ok(Self::Group(group.parse()?)),
            (Some(_), Some(_)) => Err(AddressError::Ambiguous),
            (None, None) => Err(AddressError::Missing),
        }
    }

    pub fn into_parts(self) -> (Option<u64>, Option<&'static str>) {
        match self {
            Self::Direct(id) => (Some(id), None),
            Self::Group(group) => (None, Some(group.as_str())),
        }
    }
}

/// Whether `(role, reader)` may read a message sent to `address`.
///
/// Direct messages are visible to their recipient only, never to same-role peers.
pub fn can_read(role: Role, reader: u64, address: &MessageAddress) -> bool {
    match address {
        MessageAddress::Direct(recipient) => *recipient == reader,
        MessageAddress::Group(group) => group.includes(role),
    }
}
