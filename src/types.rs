/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Coarse identity category carried in the credential.
/// Admins supersede every fine-grained permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations on the Student resource that a staff member can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentAction {
    Create,
    Read,
    Update,
    Delete,
}

impl StudentAction {
    pub const ALL: [StudentAction; 4] = [
        StudentAction::Create,
        StudentAction::Read,
        StudentAction::Update,
        StudentAction::Delete,
    ];

    /// Fixed explanation shown when a staff member attempts this action without the flag
    pub fn denial_message(&self) -> &'static str {
        match self {
            StudentAction::Create => "You don't have permission to add new students.",
            StudentAction::Read => "You don't have permission to view the student list.",
            StudentAction::Update => "You don't have permission to edit student information.",
            StudentAction::Delete => "You don't have permission to delete students.",
        }
    }

    /// Button label in the student view
    pub fn label(&self) -> &'static str {
        match self {
            StudentAction::Create => "add",
            StudentAction::Read => "view",
            StudentAction::Update => "edit",
            StudentAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for StudentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StudentAction::Create => "create",
            StudentAction::Read => "read",
            StudentAction::Update => "update",
            StudentAction::Delete => "delete",
        };
        f.write_str(name)
    }
}
