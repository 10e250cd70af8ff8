pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod panel;
pub mod permissions;
pub mod types;

pub use auth::{Claims, Credential, CredentialCodec, JwtCodec, Session, SessionStore};
pub use panel::{AdminPanel, PanelError};
pub use permissions::{PermissionResolver, PermissionSet};
pub use types::{Role, StudentAction};
