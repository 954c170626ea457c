//! Storage collaborators for the authorization core
//!
//! The core reads and writes one row per logical operation through these
//! synchronous traits. Two backends are provided: `MemoryStore` (dashmap) and
//! `SqliteStore` (rusqlite).

pub mod memory;
pub mod schemas;
pub mod sqlite;

pub use memory::MemoryStore;
pub use schemas::{
    AccessRequestRecord, Decision, DocumentRecord, MessageRecord, NewAccessRequest, NewDocument,
    NewMessage, NewPrincipal, PrincipalRecord, RequestStatus,
};
pub use sqlite::SqliteStore;

/// Failure inside a store backend. Never shown to clients verbatim.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violated
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back to a record
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Principal lookup and registration
pub trait CredentialStore: Send + Sync {
    fn find_by_identity(&self, email: &str) -> Result<Option<PrincipalRecord>, StoreError>;

    fn find_by_id(&self, id: u64) -> Result<Option<PrincipalRecord>, StoreError>;

    /// Fails with `StoreError::Duplicate` if the email is taken
    fn insert_principal(&self, principal: NewPrincipal) -> Result<PrincipalRecord, StoreError>;

    fn list_principals(&self) -> Result<Vec<PrincipalRecord>, StoreError>;
}

pub trait DocumentStore: Send + Sync {
    fn insert_document(&self, document: NewDocument) -> Result<DocumentRecord, StoreError>;

    fn get_document(&self, id: u64) -> Result<Option<DocumentRecord>, StoreError>;

    fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError>;
}

pub trait MessageStore: Send + Sync {
    fn insert_message(&self, message: NewMessage) -> Result<MessageRecord, StoreError>;

    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError>;
}

pub trait RequestStore: Send + Sync {
    fn insert_request(&self, request: NewAccessRequest)
        -> Result<AccessRequestRecord, StoreError>;

    fn list_requests(&self) -> Result<Vec<AccessRequestRecord>, StoreError>;

    /// Returns the updated row, or `None` if no request has this id
    fn set_request_status(
        &self,
        id: u64,
        status: RequestStatus,
    ) -> Result<Option<AccessRequestRecord>, StoreError>;
}

/// Every collaborator the WorkStation service needs, in one backend
pub trait WorkstationStore: CredentialStore + DocumentStore + MessageStore + RequestStore {}

impl<T> WorkstationStore for T where T: CredentialStore + DocumentStore + MessageStore + RequestStore
{}
