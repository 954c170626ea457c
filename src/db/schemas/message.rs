//! Message record schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::visibility::MessageAddress;

pub const MESSAGE_TABLE: &str = "messages";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: u64,
    pub sender_id: u64,
    /// One individual or one role-group, never both
    pub address: MessageAddress,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub sender_id: u64,
    pub address: MessageAddress,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn into_record(self, id: u64) -> MessageRecord {
        MessageRecord {
            id,
            sender_id: self.sender_id,
            address: self.address,
            content: self.content,
            created_at: self.created_at,
        }
    }
}
