pub mod session;
pub mod storage;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Role;

pub use session::{Session, SessionError, SessionStore};
pub use storage::{FileTokenStorage, MemoryTokenStorage, StorageError, TokenStorage};

/// Opaque bearer token as issued by the backend.
///
/// Only the codec looks inside it; everything else treats it as a string to
/// persist and to attach to requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Identity projected from a successfully decoded credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub id: String,
    pub role: Role,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Claims {
    /// Two claims describe the same identity when subject and role agree
    pub fn same_identity(&self, other: &Claims) -> bool {
        self.id == other.id && self.role == other.role
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Informational only; expiry is enforced by the server
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

/// Payload layout as signed by the backend
#[derive(Debug, Deserialize)]
struct TokenPayload {
    id: String,
    role: Role,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("Token subject is empty")]
    EmptySubject,

    #[error("Token timestamp out of range: {0}")]
    TimestampOutOfRange(&'static str),
}

/// Turns a bearer credential into typed claims.
///
/// Implementations must be pure and must never return partially populated
/// claims: any structural or semantic problem is a `DecodeError`.
pub trait CredentialCodec: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, DecodeError>;
}

/// Decodes the three-part signed JWT issued by the backend.
///
/// The signature is not verified: the client is not a trust boundary and
/// never holds the signing secret.
#[derive(Debug, Clone, Default)]
pub struct JwtCodec;

impl JwtCodec {
    pub fn new() -> Self {
        Self
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        validation
    }
}

impl CredentialCodec for JwtCodec {
    fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        let token = token.trim();
        if token.split('.').count() != 3 {
            return Err(DecodeError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        }

        let data = decode::<TokenPayload>(token, &DecodingKey::from_secret(&[]), &Self::validation())
            .map_err(|e| match e.kind() {
                ErrorKind::Json(inner) => DecodeError::InvalidClaims(inner.to_string()),
                _ => DecodeError::Malformed(e.to_string()),
            })?;

        let payload = data.claims;
        if payload.id.trim().is_empty() {
            return Err(DecodeError::EmptySubject);
        }

        Ok(Claims {
            id: payload.id,
            role: payload.role,
            issued_at: timestamp(payload.iat, "iat")?,
            expires_at: timestamp(payload.exp, "exp")?,
        })
    }
}

fn timestamp(value: Option<i64>, field: &'static str) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match value {
        None => Ok(None),
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .map(Some)
            .ok_or(DecodeError::TimestampOutOfRange(field)),
    }
}
