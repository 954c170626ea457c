//! SQLite store backend
//!
//! One connection behind a mutex. Timestamps are stored as Unix milliseconds.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use super::schemas::{DOCUMENT_TABLE, MESSAGE_TABLE, PRINCIPAL_TABLE, REQUEST_TABLE};
use super::{
    AccessRequestRecord, CredentialStore, DocumentRecord, DocumentStore, MessageRecord,
    MessageStore, NewAccessRequest, NewDocument, NewMessage, NewPrincipal, PrincipalRecord,
    RequestStatus, RequestStore, StoreError,
};
use crate::auth::Role;
use crate::visibility::{MessageAddress, VisibilityRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uploader_id INTEGER NOT NULL REFERENCES users(id),
    filename TEXT NOT NULL,
    stored_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    visible_to_admin INTEGER NOT NULL DEFAULT 0,
    visible_to_manager INTEGER NOT NULL DEFAULT 0,
    visible_to_employee INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL REFERENCES users(id),
    recipient_id INTEGER,
    recipient_group TEXT,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    CHECK ((recipient_id IS NULL) <> (recipient_group IS NULL))
);
CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    resource TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'Pending',
    digital_signature TEXT,
    created_at INTEGER NOT NULL
);
";

/// WorkStation tables in a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file and ensure the schema exists
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Truncate to the precision the columns keep
fn column_precision(at: DateTime<Utc>) -> Result<DateTime<Utc>, StoreError> {
    from_millis(to_millis(at))
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}

fn to_id(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::Corrupt(format!("negative row id: {raw}")))
}

fn duplicate_or(err: rusqlite::Error, what: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Duplicate(what.to_string())
        }
        _ => StoreError::Sqlite(err),
    }
}

// Rows are first read into plain column tuples, then converted, so that
// mapping failures surface as `StoreError::Corrupt` rather than SQLite errors.

type PrincipalRow = (i64, String, String, String, String, i64);

fn read_principal(row: &Row<'_>) -> rusqlite::Result<PrincipalRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn principal_from_row(
    (id, username, email, password_hash, role, created_at): PrincipalRow,
) -> Result<PrincipalRecord, StoreError> {
    Ok(PrincipalRecord {
        id: to_id(id)?,
        username,
        email,
        password_hash,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: from_millis(created_at)?,
    })
}

const PRINCIPAL_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

type DocumentRow = (i64, i64, String, String, String, bool, bool, bool, i64);

fn read_document(row: &Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn document_from_row(
    (id, owner, filename, stored_name, description, admin, manager, employee, created_at): DocumentRow,
) -> Result<DocumentRecord, StoreError> {
    Ok(DocumentRecord {
        id: to_id(id)?,
        filename,
        stored_name,
        description,
        visibility: VisibilityRecord {
            visible_to_admin: admin,
            visible_to_manager: manager,
            visible_to_employee: employee,
            owner: to_id(owner)?,
        },
        created_at: from_millis(created_at)?,
    })
}

const DOCUMENT_COLUMNS: &str = "id, uploader_id, filename, stored_name, description, \
     visible_to_admin, visible_to_manager, visible_to_employee, created_at";

type MessageRow = (i64, i64, Option<i64>, Option<String>, String, i64);

fn read_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn message_from_row(
    (id, sender_id, recipient_id, recipient_group, content, created_at): MessageRow,
) -> Result<MessageRecord, StoreError> {
    let recipient_id = recipient_id.map(to_id).transpose()?;
    let address = MessageAddress::from_parts(recipient_id, recipient_group.as_deref())
        .map_err(|e| StoreError::Corrupt(format!("message {id}: {e}")))?;
    Ok(MessageRecord {
        id: to_id(id)?,
        sender_id: to_id(sender_id)?,
        address,
        content,
        created_at: from_millis(created_at)?,
    })
}

const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, recipient_group, content, created_at";

type RequestRow = (i64, i64, String, String, String, Option<String>, i64);

fn read_request(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn request_from_row(
    (id, requester_id, resource, reason, status, digital_signature, created_at): RequestRow,
) -> Result<AccessRequestRecord, StoreError> {
    Ok(AccessRequestRecord {
        id: to_id(id)?,
        requester_id: to_id(requester_id)?,
        resource,
        reason,
        status: status
            .parse::<RequestStatus>()
            .map_err(StoreError::Corrupt)?,
        digital_signature,
        created_at: from_millis(created_at)?,
    })
}

const REQUEST_COLUMNS: &str =
    "id, user_id, resource, reason, status, digital_signature, created_at";

impl CredentialStore for SqliteStore {
    fn find_by_identity(&self, email: &str) -> Result<Option<PrincipalRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .prepare_cached(&format!(
                "SELECT {PRINCIPAL_COLUMNS} FROM {PRINCIPAL_TABLE} WHERE email = ?1"
            ))?
            .query_row([email], read_principal)
            .optional()?;
        row.map(principal_from_row).transpose()
    }

    fn find_by_id(&self, id: u64) -> Result<Option<PrincipalRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .prepare_cached(&format!(
                "SELECT {PRINCIPAL_COLUMNS} FROM {PRINCIPAL_TABLE} WHERE id = ?1"
            ))?
            .query_row([id as i64], read_principal)
            .optional()?;
        row.map(principal_from_row).transpose()
    }

    fn insert_principal(&self, mut principal: NewPrincipal) -> Result<PrincipalRecord, StoreError> {
        let conn = self.conn()?;
        principal.created_at = column_precision(principal.created_at)?;
        conn.execute(
            &format!(
                "INSERT INTO {PRINCIPAL_TABLE} (username, email, password_hash, role, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                principal.username,
                principal.email,
                principal.password_hash,
                principal.role.as_str(),
                to_millis(principal.created_at)
            ],
        )
        .map_err(|e| duplicate_or(e, &format!("email {} already registered", principal.email)))?;
        let id = to_id(conn.last_insert_rowid())?;
        Ok(principal.into_record(id))
    }

    fn list_principals(&self) -> Result<Vec<PrincipalRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM {PRINCIPAL_TABLE} ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], read_principal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(principal_from_row).collect()
    }
}

impl DocumentStore for SqliteStore {
    fn insert_document(&self, mut document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let conn = self.conn()?;
        document.created_at = column_precision(document.created_at)?;
        let v = document.visibility;
        conn.execute(
            &format!(
                "INSERT INTO {DOCUMENT_TABLE} (uploader_id, filename, stored_name, description, \
                 visible_to_admin, visible_to_manager, visible_to_employee, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                v.owner as i64,
                document.filename,
                document.stored_name,
                document.description,
                v.visible_to_admin,
                v.visible_to_manager,
                v.visible_to_employee,
                to_millis(document.created_at)
            ],
        )?;
        let id = to_id(conn.last_insert_rowid())?;
        Ok(document.into_record(id))
    }

    fn get_document(&self, id: u64) -> Result<Option<DocumentRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .prepare_cached(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM {DOCUMENT_TABLE} WHERE id = ?1"
            ))?
            .query_row([id as i64], read_document)
            .optional()?;
        row.map(document_from_row).transpose()
    }

    fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM {DOCUMENT_TABLE} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], read_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(document_from_row).collect()
    }
}

impl MessageStore for SqliteStore {
    fn insert_message(&self, mut message: NewMessage) -> Result<MessageRecord, StoreError> {
        let conn = self.conn()?;
        message.created_at = column_precision(message.created_at)?;
        let (recipient_id, recipient_group) = message.address.into_parts();
        conn.execute(
            &format!(
                "INSERT INTO {MESSAGE_TABLE} (sender_id, recipient_id, recipient_group, content, \
                 created_at) VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                message.sender_id as i64,
                recipient_id.map(|id| id as i64),
                recipient_group,
                message.content,
                to_millis(message.created_at)
            ],
        )?;
        let id = to_id(conn.last_insert_rowid())?;
        Ok(message.into_record(id))
    }

    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_TABLE} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], read_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(message_from_row).collect()
    }
}

impl RequestStore for SqliteStore {
    fn insert_request(
        &self,
        mut request: NewAccessRequest,
    ) -> Result<AccessRequestRecord, StoreError> {
        let conn = self.conn()?;
        request.created_at = column_precision(request.created_at)?;
        conn.execute(
            &format!(
                "INSERT INTO {REQUEST_TABLE} (user_id, resource, reason, status, \
                 digital_signature, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                request.requester_id as i64,
                request.resource,
                request.reason,
                RequestStatus::Pending.as_str(),
                request.digital_signature,
                to_millis(request.created_at)
            ],
        )?;
        let id = to_id(conn.last_insert_rowid())?;
        Ok(request.into_record(id))
    }

    fn list_requests(&self) -> Result<Vec<AccessRequestRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {REQUEST_COLUMNS} FROM {REQUEST_TABLE} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], read_request)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(request_from_row).collect()
    }

    fn set_request_status(
        &self,
        id: u64,
        status: RequestStatus,
    ) -> Result<Option<AccessRequestRecord>, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            &format!("UPDATE {REQUEST_TABLE} SET status = ?1 WHERE id = ?2"),
            params![status.as_str(), id as i64],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let row = conn
            .prepare_cached(&format!(
                "SELECT {REQUEST_COLUMNS} FROM {REQUEST_TABLE} WHERE id = ?1"
            ))?
            .query_row([id as i64], read_request)
            .optional()?;
        row.map(request_from_row).transpose()
    }
}
