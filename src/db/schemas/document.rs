//! Document record schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::visibility::VisibilityRecord;

pub const DOCUMENT_TABLE: &str = "documents";

/// Document metadata row. File bytes live outside the core.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: u64,

    /// Name shown to users
    pub filename: String,

    /// Opaque reference into file storage
    pub stored_name: String,

    pub description: String,

    /// Flags and owner, fixed at upload
    pub visibility: VisibilityRecord,

    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn owner_id(&self) -> u64 {
        self.visibility.owner
    }
}

#[derive(Clone, Debug)]
pub struct NewDocument {
    pub filename: String,
    pub stored_name: String,
    pub description: String,
    pub visibility: VisibilityRecord,
    pub created_at: DateTime<Utc>,
}

impl NewDocument {
    pub fn into_record(self, id: u64) -> DocumentRecord {
        DocumentRecord {
            id,
            filename: self.filename,
            stored_name: self.stored_name,
            description: self.description,
            visibility: self.visibility,
            created_at: self.created_at,
        }
    }
}
