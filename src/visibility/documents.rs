//! Document visibility
//!
//! Each document carries three independent role flags plus its owner. The
//! owner can always see their own upload, whatever the flags say.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Visibility flags fixed at upload time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRecord {
    pub visible_to_admin: bool,
    pub visible_to_manager: bool,
    pub visible_to_employee: bool,
    /// Principal id of the uploader
    pub owner: u64,
}

/// Flags an uploader asks for. Ignored for Employee uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedVisibility {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub manager: bool,
    #[serde(default)]
    pub employee: bool,
}

impl VisibilityRecord {
    /// Flags for a new upload.
    ///
    /// Employee uploads are visible to every role regardless of `requested`.
    pub fn for_upload(uploader: Role, owner: u64, requested: RequestedVisibility) -> Self {
        match uploader {
            Role::Employee => Self {
                visible_to_admin: true,
                visible_to_manager: true,
                visible_to_employee: true,
                owner,
            },
            Role::Admin | Role::Manager => Self {
                visible_to_admin: requested.admin,
                visible_to_manager: requested.manager,
                visible_to_employee: requested.employee,
                owner,
            },
        }
    }

    pub fn visible_to(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.visible_to_admin,
            Role::Manager => self.visible_to_manager,
            Role::Employee => self.visible_to_employee,
        }
    }
}

/// Whether `(role, reader)` may see or download a document
pub fn can_view(role: Role, reader: u64, record: &VisibilityRecord) -> bool {
    record.visible_to(role) || record.owner == reader
}
