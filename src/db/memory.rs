//! In-memory store backend
//!
//! Lock-free maps keyed by row id, with atomic id counters starting at 1.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::{
    AccessRequestRecord, CredentialStore, DocumentRecord, DocumentStore, MessageRecord,
    MessageStore, NewAccessRequest, NewDocument, NewMessage, NewPrincipal, PrincipalRecord,
    RequestStatus, RequestStore, StoreError,
};

/// Monotonic row id source
#[derive(Debug)]
struct IdSequence(AtomicU64);

impl IdSequence {
    fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// All WorkStation tables held in process memory
#[derive(Debug)]
pub struct MemoryStore {
    principals: DashMap<u64, PrincipalRecord>,
    /// email -> principal id
    by_email: DashMap<String, u64>,
    documents: DashMap<u64, DocumentRecord>,
    messages: DashMap<u64, MessageRecord>,
    requests: DashMap<u64, AccessRequestRecord>,
    principal_ids: IdSequence,
    document_ids: IdSequence,
    message_ids: IdSequence,
    request_ids: IdSequence,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            principals: DashMap::new(),
            by_email: DashMap::new(),
            documents: DashMap::new(),
            messages: DashMap::new(),
            requests: DashMap::new(),
            principal_ids: IdSequence::new(),
            document_ids: IdSequence::new(),
            message_ids: IdSequence::new(),
            request_ids: IdSequence::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryStore {
    fn find_by_identity(&self, email: &str) -> Result<Option<PrincipalRecord>, StoreError> {
        let Some(id) = self.by_email.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.principals.get(&id).map(|p| p.value().clone()))
    }

    fn find_by_id(&self, id: u64) -> Result<Option<PrincipalRecord>, StoreError> {
        Ok(self.principals.get(&id).map(|p| p.value().clone()))
    }

    fn insert_principal(&self, principal: NewPrincipal) -> Result<PrincipalRecord, StoreError> {
        // Holding the index entry makes the uniqueness check and insert atomic.
        match self.by_email.entry(principal.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "email {} already registered",
                principal.email
            ))),
            Entry::Vacant(slot) => {
                let id = self.principal_ids.next();
                let record = principal.into_record(id);
                self.principals.insert(id, record.clone());
                slot.insert(id);
                debug!(id, "Principal inserted");
                Ok(record)
            }
        }
    }

    fn list_principals(&self) -> Result<Vec<PrincipalRecord>, StoreError> {
        let mut all: Vec<_> = self.principals.iter().map(|p| p.value().clone()).collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}

impl DocumentStore for MemoryStore {
    fn insert_document(&self, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let id = self.document_ids.next();
        let record = document.into_record(id);
        self.documents.insert(id, record.clone());
        Ok(record)
    }

    fn get_document(&self, id: u64) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self.documents.get(&id).map(|d| d.value().clone()))
    }

    fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self.documents.iter().map(|d| d.value().clone()).collect())
    }
}

impl MessageStore for MemoryStore {
    fn insert_message(&self, message: NewMessage) -> Result<MessageRecord, StoreError> {
        let id = self.message_ids.next();
        let record = message.into_record(id);
        self.messages.insert(id, record.clone());
        Ok(record)
    }

    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        Ok(self.messages.iter().map(|m| m.value().clone()).collect())
    }
}

impl RequestStore for MemoryStore {
    fn insert_request(
        &self,
        request: NewAccessRequest,
    ) -> Result<AccessRequestRecord, StoreError> {
        let id = self.request_ids.next();
        let record = request.into_record(id);
        self.requests.insert(id, record.clone());
        Ok(record)
    }

    fn list_requests(&self) -> Result<Vec<AccessRequestRecord>, StoreError> {
        Ok(self.requests.iter().map(|r| r.value().clone()).collect())
    }

    fn set_request_status(
        &self,
        id: u64,
        status: RequestStatus,
    ) -> Result<Option<AccessRequestRecord>, StoreError> {
        Ok(self.requests.get_mut(&id).map(|mut r| {
            r.status = status;
            r.clone()
        }))
    }
}
