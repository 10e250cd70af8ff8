pub mod resolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::types::StudentAction;

pub use resolver::{PermissionError, PermissionResolver};

/// Per-staff CRUD flags over the Student resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl PermissionSet {
    /// Fail-closed default: nothing confirmed
    pub const fn none() -> Self {
        Self {
            can_create: false,
            can_read: false,
            can_update: false,
            can_delete: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            can_create: true,
            can_read: true,
            can_update: true,
            can_delete: true,
        }
    }

    pub fn allows(&self, action: StudentAction) -> bool {
        match action {
            StudentAction::Create => self.can_create,
            StudentAction::Read => self.can_read,
            StudentAction::Update => self.can_update,
            StudentAction::Delete => self.can_delete,
        }
    }

    pub fn with(mut self, action: StudentAction, granted: bool) -> Self {
        match action {
            StudentAction::Create => self.can_create = granted,
            StudentAction::Read => self.can_read = granted,
            StudentAction::Update => self.can_update = granted,
            StudentAction::Delete => self.can_delete = granted,
        }
        self
    }

    /// Actions currently granted, in CRUD order
    pub fn granted(&self) -> Vec<StudentAction> {
        StudentAction::ALL
            .into_iter()
            .filter(|action| self.allows(*action))
            .collect()
    }
}

/// State of one staff member's flags in the resolver cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A fetch is in flight; nothing confirmed yet
    Pending,
    Resolved(PermissionSet),
    /// Last fetch failed; carries the reason for display
    Failed(String),
}

impl Resolution {
    /// Flags in force for this state. Only a resolved value grants anything.
    pub fn effective(&self) -> PermissionSet {
        match self {
            Resolution::Resolved(set) => *set,
            Resolution::Pending | Resolution::Failed(_) => PermissionSet::none(),
        }
    }
}

/// Backend side of the permission contract
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn fetch_permissions(&self, staff_id: &str) -> Result<PermissionSet, ClientError>;

    async fn store_permissions(
        &self,
        staff_id: &str,
        permissions: PermissionSet,
    ) -> Result<(), ClientError>;
}
