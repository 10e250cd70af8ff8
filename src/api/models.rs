use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::permissions::PermissionSet;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` answer; `user` is echoed for display only
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub guardian_phone: String,
    #[serde(default)]
    pub standard: String,
    #[serde(default)]
    pub age: u32,
}

/// Body of student create and edit requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub name: String,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub standard: String,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Body of staff create and edit requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// `GET /permission/get/{userId}` answer
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionEnvelope {
    #[serde(default)]
    pub permission: Option<StoredPermissions>,
}

/// Flags as the read path names them.
///
/// Older records carry the write-path name `canViewStudent`; both are folded
/// into `can_read`, preferring `canReadStudent`. Missing flags are false.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPermissions {
    #[serde(default)]
    pub can_create_student: Option<bool>,
    #[serde(default)]
    pub can_read_student: Option<bool>,
    #[serde(default)]
    pub can_view_student: Option<bool>,
    #[serde(default)]
    pub can_update_student: Option<bool>,
    #[serde(default)]
    pub can_delete_student: Option<bool>,
}

impl From<StoredPermissions> for PermissionSet {
    fn from(stored: StoredPermissions) -> Self {
        PermissionSet {
            can_create: stored.can_create_student.unwrap_or(false),
            can_read: stored
                .can_read_student
                .or(stored.can_view_student)
                .unwrap_or(false),
            can_update: stored.can_update_student.unwrap_or(false),
            can_delete: stored.can_delete_student.unwrap_or(false),
        }
    }
}

impl From<PermissionEnvelope> for PermissionSet {
    fn from(envelope: PermissionEnvelope) -> Self {
        envelope
            .permission
            .map(PermissionSet::from)
            .unwrap_or_else(PermissionSet::none)
    }
}

/// `POST /permission/{userId}` body, in the write path's naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionUpdate {
    pub can_create_student: bool,
    pub can_view_student: bool,
    pub can_update_student: bool,
    pub can_delete_student: bool,
}

impl From<PermissionSet> for PermissionUpdate {
    fn from(set: PermissionSet) -> Self {
        Self {
            can_create_student: set.can_create,
            can_view_student: set.can_read,
            can_update_student: set.can_update,
            can_delete_student: set.can_delete,
        }
    }
}
