//! WorkStation service - the vault, inbox and access-request operations
//!
//! Every operation takes the caller's bearer token first. Route-level checks
//! go through the `AccessGate`; row-level filtering goes through
//! `crate::visibility`. The service holds no mutable state of its own.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{
    AccessGate, Authenticator, CodeDelivery, LogDelivery, LoginChallenge, Permission,
    PermissionMatrix, Principal, Registration, Role, SessionGrant, TokenCodec,
};
use crate::config::GateConfig;
use crate::db::{
    AccessRequestRecord, CredentialStore, Decision, DocumentRecord, MessageRecord,
    NewAccessRequest, NewDocument, NewMessage, StoreError, WorkstationStore,
};
use crate::types::{AuthError, Clock, SystemClock};
use crate::visibility::{
    can_assign, can_read, can_view, contacts_for, request_scope, Contact, MessageAddress,
    RequestedVisibility, VisibilityRecord,
};

// ============================================================================
// Inputs
// ============================================================================

/// Metadata for a file the caller has already stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub filename: String,
    pub stored_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: RequestedVisibility,
}

/// Outgoing message. Exactly one of `recipient_id` and `recipient_group`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageDraft {
    #[serde(default)]
    pub recipient_id: Option<u64>,
    #[serde(default)]
    pub recipient_group: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestDraft {
    pub resource: String,
    #[serde(default)]
    pub reason: String,
    /// Kept verbatim. Never verified.
    #[serde(default)]
    pub digital_signature: Option<String>,
}

// ============================================================================
// Service
// ============================================================================

pub struct Workstation {
    authenticator: Authenticator,
    gate: AccessGate,
    store: Arc<dyn WorkstationStore>,
    /// Stamps new rows; shared with the gate and the authenticator
    clock: Arc<dyn Clock>,
}

pub struct WorkstationBuilder {
    credentials: Arc<dyn CredentialStore>,
    store: Arc<dyn WorkstationStore>,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    delivery: Arc<dyn CodeDelivery>,
    matrix: Arc<PermissionMatrix>,
    config: GateConfig,
}

impl WorkstationBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn delivery(mut self, delivery: Arc<dyn CodeDelivery>) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn matrix(mut self, matrix: Arc<PermissionMatrix>) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Workstation {
        let authenticator = Authenticator::new(
            self.credentials,
            self.codec.clone(),
            self.clock.clone(),
            self.delivery,
            self.config,
        );
        let gate = AccessGate::new(self.codec, self.matrix, self.clock.clone());

        Workstation {
            authenticator,
            gate,
            store: self.store,
            clock: self.clock,
        }
    }
}

impl Workstation {
    /// Start building a service over one store backend.
    ///
    /// Defaults: system clock, log delivery, the standard matrix, 300/3600 s lifetimes.
    pub fn builder<S>(store: Arc<S>, codec: Arc<TokenCodec>) -> WorkstationBuilder
    where
        S: WorkstationStore + 'static,
    {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let store: Arc<dyn WorkstationStore> = store;

        WorkstationBuilder {
            credentials,
            store,
            codec,
            clock: Arc::new(SystemClock),
            delivery: Arc::new(LogDelivery),
            matrix: Arc::new(PermissionMatrix::standard()),
            config: GateConfig::default(),
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    // --- Login ---

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        self.authenticator.register(username, email, password)
    }

    pub fn begin_login(&self, email: &str, password: &str) -> Result<LoginChallenge, AuthError> {
        self.authenticator.begin_login(email, password)
    }

    pub fn complete_login(&self, temp_token: &str, code: &str) -> Result<SessionGrant, AuthError> {
        self.authenticator.complete_login(temp_token, code)
    }

    pub fn authorize(
        &self,
        token: Option<&str>,
        permission: Permission,
    ) -> Result<Principal, AuthError> {
        self.gate.authorize(token, permission)
    }

    // --- Documents ---

    pub fn upload_document(
        &self,
        token: Option<&str>,
        upload: DocumentUpload,
    ) -> Result<DocumentRecord, AuthError> {
        let caller = self.gate.authorize(token, Permission::Files)?;

        if upload.filename.trim().is_empty() || upload.stored_name.trim().is_empty() {
            return Err(AuthError::BadRequest("No file uploaded".into()));
        }

        let visibility = VisibilityRecord::for_upload(caller.role, caller.id, upload.visibility);
        let record = self
            .store
            .insert_document(NewDocument {
                filename: upload.filename,
                stored_name: upload.stored_name,
                description: upload.description,
                visibility,
                created_at: self.clock.now_utc(),
            })
            .map_err(|e| store_failure("insert_document", e))?;

        info!(
            id = record.id,
            owner = caller.id,
            role = %caller.role,
            "Document uploaded"
        );
        Ok(record)
    }

    /// Documents the caller may see, newest first
    pub fn list_documents(&self, token: Option<&str>) -> Result<Vec<DocumentRecord>, AuthError> {
        let caller = self.gate.authorize(token, Permission::Files)?;

        let mut documents: Vec<DocumentRecord> = self
            .store
            .list_documents()
            .map_err(|e| store_failure("list_documents", e))?
            .into_iter()
            .filter(|doc| can_view(caller.role, caller.id, &doc.visibility))
            .collect();
        documents.sort_by_key(|doc| Reverse((doc.created_at, doc.id)));

        Ok(documents)
    }

    pub fn download_document(
        &self,
        token: Option<&str>,
        id: u64,
    ) -> Result<DocumentRecord, AuthError> {
        let caller = self.gate.authorize(token, Permission::Files)?;

        let document = self
            .store
            .get_document(id)
            .map_err(|e| store_failure("get_document", e))?
            .ok_or_else(|| AuthError::NotFound(format!("Document {id}")))?;

        if !can_view(caller.role, caller.id, &document.visibility) {
            warn!(id, reader = caller.id, role = %caller.role, "Document download denied");
            return Err(AuthError::Forbidden("Access Denied".into()));
        }

        Ok(document)
    }

    // --- Messages ---

    pub fn send_message(
        &self,
        token: Option<&str>,
        draft: MessageDraft,
    ) -> Result<MessageRecord, AuthError> {
        let caller = self.gate.authenticate(token)?;

        let address =
            MessageAddress::from_parts(draft.recipient_id, draft.recipient_group.as_deref())?;
        if draft.content.trim().is_empty() {
            return Err(AuthError::BadRequest("Message content is required".into()));
        }
        if let MessageAddress::Direct(recipient) = address {
            self.store
                .find_by_id(recipient)
                .map_err(|e| store_failure("find_by_id", e))?
                .ok_or_else(|| AuthError::NotFound(format!("Recipient {recipient}")))?;
        }

        let record = self
            .store
            .insert_message(NewMessage {
                sender_id: caller.id,
                address,
                content: draft.content,
                created_at: self.clock.now_utc(),
            })
            .map_err(|e| store_failure("insert_message", e))?;

        info!(id = record.id, sender = caller.id, ?address, "Message sent");
        Ok(record)
    }

    /// Messages addressed to the caller or to a group their role belongs to
    pub fn inbox(&self, token: Option<&str>) -> Result<Vec<MessageRecord>, AuthError> {
        let caller = self.gate.authenticate(token)?;

        let mut messages: Vec<MessageRecord> = self
            .store
            .list_messages()
            .map_err(|e| store_failure("list_messages", e))?
            .into_iter()
            .filter(|msg| can_read(caller.role, caller.id, &msg.address))
            .collect();
        messages.sort_by_key(|msg| Reverse((msg.created_at, msg.id)));

        Ok(messages)
    }

    pub fn contacts(&self, token: Option<&str>) -> Result<Vec<Contact>, AuthError> {
        let caller = self.gate.authenticate(token)?;

        let principals = self
            .store
            .list_principals()
            .map_err(|e| store_failure("list_principals", e))?;

        Ok(contacts_for(caller.id, caller.role, &principals))
    }

    /// Every Employee, for Managers and Admins handing out work
    pub fn team_roster(&self, token: Option<&str>) -> Result<Vec<Contact>, AuthError> {
        let caller = self.gate.authenticate(token)?;
        if !can_assign(caller.role) {
            warn!(id = caller.id, role = %caller.role, "Team roster denied");
            return Err(AuthError::Forbidden("Access Denied".into()));
        }

        Ok(self
            .store
            .list_principals()
            .map_err(|e| store_failure("list_principals", e))?
            .iter()
            .filter(|p| p.role == Role::Employee)
            .map(Contact::from)
            .collect())
    }

    // --- Access requests ---

    pub fn submit_request(
        &self,
        token: Option<&str>,
        draft: RequestDraft,
    ) -> Result<AccessRequestRecord, AuthError> {
        let caller = self.gate.authorize(token, Permission::SubmitRequest)?;

        if draft.resource.trim().is_empty() {
            return Err(AuthError::BadRequest("Resource is required".into()));
        }

        let record = self
            .store
            .insert_request(NewAccessRequest {
                requester_id: caller.id,
                resource: draft.resource,
                reason: draft.reason,
                digital_signature: draft.digital_signature,
                created_at: self.clock.now_utc(),
            })
            .map_err(|e| store_failure("insert_request", e))?;

        info!(id = record.id, requester = caller.id, resource = %record.resource, "Access request filed");
        Ok(record)
    }

    /// Requests within the caller's scope, newest first
    pub fn list_requests(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<AccessRequestRecord>, AuthError> {
        let caller = self.gate.authenticate(token)?;
        let scope = request_scope(caller.role, caller.id);

        let mut requests: Vec<AccessRequestRecord> = self
            .store
            .list_requests()
            .map_err(|e| store_failure("list_requests", e))?
            .into_iter()
            .filter(|req| scope.includes(req))
            .collect();
        requests.sort_by_key(|req| Reverse((req.created_at, req.id)));

        Ok(requests)
    }

    pub fn decide_request(
        &self,
        token: Option<&str>,
        id: u64,
        decision: Decision,
    ) -> Result<AccessRequestRecord, AuthError> {
        let caller = self.gate.authorize(token, Permission::ApproveRequests)?;

        let record = self
            .store
            .set_request_status(id, decision.status())
            .map_err(|e| store_failure("set_request_status", e))?
            .ok_or_else(|| AuthError::NotFound(format!("Request {id}")))?;

        info!(id, approver = caller.id, status = %record.status, "Access request decided");
        Ok(record)
    }
}

fn store_failure(operation: &'static str, err: StoreError) -> AuthError {
    error!(operation, error = %err, "Store failure");
    AuthError::Store(err)
}
