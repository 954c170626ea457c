//! Row schemas for principals, documents, messages and access requests

mod document;
mod message;
mod principal;
mod request;

pub use document::{DocumentRecord, NewDocument, DOCUMENT_TABLE};
pub use message::{MessageRecord, NewMessage, MESSAGE_TABLE};
pub use principal::{NewPrincipal, PrincipalRecord, PRINCIPAL_TABLE};
pub use request::{AccessRequestRecord, Decision, NewAccessRequest, RequestStatus, REQUEST_TABLE};
