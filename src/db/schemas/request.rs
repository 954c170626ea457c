//! Access request record schema
//!
//! The `digital_signature` column is stored verbatim and never verified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const REQUEST_TABLE: &str = "requests";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(format!("Unknown request status: {other}")),
        }
    }
}

/// Outcome chosen by an approver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccessRequestRecord {
    pub id: u64,
    pub requester_id: u64,
    pub resource: String,
    pub reason: String,
    pub status: RequestStatus,
    pub digital_signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewAccessRequest {
    pub requester_id: u64,
    pub resource: String,
    pub reason: String,
    pub digital_signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAccessRequest {
    pub fn into_record(self, id: u64) -> AccessRequestRecord {
        AccessRequestRecord {
            id,
            requester_id: self.requester_id,
            resource: self.resource,
            reason: self.reason,
            status: RequestStatus::Pending,
            digital_signature: self.digital_signature,
            created_at: self.created_at,
        }
    }
}
