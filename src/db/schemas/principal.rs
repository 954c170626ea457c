//! Principal record schema
//!
//! Stores credentials and the role derived at registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Table name for principals
pub const PRINCIPAL_TABLE: &str = "users";

/// Principal row as stored
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PrincipalRecord {
    pub id: u64,

    /// Display name
    pub username: String,

    /// Login identity, unique across principals
    pub email: String,

    /// Argon2 password hash
    #[serde(default, skip_serializing)]
    pub password_hash: String,

    /// Stored redundantly so login never re-derives it
    pub role: Role,

    pub created_at: DateTime<Utc>,
}

/// Principal row before the store assigns an id
#[derive(Clone, Debug)]
pub struct NewPrincipal {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl NewPrincipal {
    pub fn into_record(self, id: u64) -> PrincipalRecord {
        PrincipalRecord {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            created_at: self.created_at,
        }
    }
}
