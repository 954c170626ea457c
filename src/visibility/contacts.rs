//! Who may address whom
//!
//! The table is asymmetric on purpose: a Manager can write to Admins, but an
//! Employee never sees an Admin in their contact list.

use serde::Serialize;

use crate::auth::Role;
use crate::db::PrincipalRecord;

/// Sender role -> recipient roles it may address
pub const ADDRESS_TABLE: &[(Role, &[Role])] = &[
    (Role::Admin, &[Role::Manager]),
    (Role::Manager, &[Role::Admin, Role::Employee]),
    (Role::Employee, &[Role::Manager, Role::Employee]),
];

pub fn addressable_roles(from: Role) -> &'static [Role] {
    ADDRESS_TABLE
        .iter()
        .find(|(sender, _)| *sender == from)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

pub fn can_address(from: Role, to: Role) -> bool {
    addressable_roles(from).contains(&to)
}

/// Contact list entry, without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: u64,
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl From<&PrincipalRecord> for Contact {
    fn from(p: &PrincipalRecord) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            role: p.role,
            email: p.email.clone(),
        }
    }
}

/// Principals the caller may address, excluding the caller
pub fn contacts_for(
    caller_id: u64,
    caller_role: Role,
    principals: &[PrincipalRecord],
) -> Vec<Contact> {
    principals
        .iter()
        .filter(|p| p.id != caller_id && can_address(caller_role, p.role))
        .map(Contact::from)
        .collect()
}
