//! Object-level visibility
//!
//! Fine-grained, per-row predicates. Route-level permission checks live in
//! `auth::AccessGate` and are never mixed in here.

pub mod assignments;
pub mod contacts;
pub mod documents;
pub mod messages;
pub mod requests;

pub use assignments::{assignment_scope, can_assign, AssignmentParties, AssignmentScope};
pub use contacts::{addressable_roles, can_address, contacts_for, Contact};
pub use documents::{can_view, RequestedVisibility, VisibilityRecord};
pub use messages::{can_read, AddressError, MessageAddress, RoleGroup};
pub use requests::{request_scope, RequestScope};
