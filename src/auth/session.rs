use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::storage::{StorageError, TokenStorage};
use super::{Claims, Credential, CredentialCodec, DecodeError, JwtCodec};

/// Current authentication state.
///
/// Token and identity live in one optional pair, so a session can never hold
/// one without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    active: Option<(Credential, Claims)>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    fn authenticated(token: Credential, identity: Claims) -> Self {
        Self {
            active: Some((token, identity)),
        }
    }

    pub fn token(&self) -> Option<&Credential> {
        self.active.as_ref().map(|(token, _)| token)
    }

    pub fn identity(&self) -> Option<&Claims> {
        self.active.as_ref().map(|(_, identity)| identity)
    }

    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Credential rejected: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Process-wide holder of the session and its durable copy.
///
/// Cloning yields another handle onto the same state. The lock is never held
/// across an await point.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    codec: Arc<dyn CredentialCodec>,
    storage: Arc<dyn TokenStorage>,
}

impl SessionStore {
    /// Restore the session persisted by a previous process, if it still decodes
    pub fn initialize(codec: Arc<dyn CredentialCodec>, storage: Arc<dyn TokenStorage>) -> Self {
        let session = match storage.load() {
            Ok(Some(token)) => match codec.decode(&token) {
                Ok(identity) => {
                    tracing::debug!("Restored session for {} ({})", identity.id, identity.role);
                    Session::authenticated(Credential::new(token), identity)
                }
                Err(e) => {
                    tracing::warn!("Discarding persisted credential: {}", e);
                    discard(storage.as_ref());
                    Session::empty()
                }
            },
            Ok(None) => Session::empty(),
            Err(e) => {
                tracing::warn!("Unable to read persisted credential: {}", e);
                discard(storage.as_ref());
                Session::empty()
            }
        };

        Self {
            state: Arc::new(RwLock::new(session)),
            codec,
            storage,
        }
    }

    /// Same as `initialize` with the JWT codec
    pub fn with_storage(storage: Arc<dyn TokenStorage>) -> Self {
        Self::initialize(Arc::new(JwtCodec::new()), storage)
    }

    /// Replace the session with a freshly issued credential.
    ///
    /// A credential that fails to decode empties the session and the durable
    /// copy. If the new credential cannot be persisted the previous session
    /// is left untouched.
    pub fn commit(&self, token: impl Into<String>) -> Result<Claims, SessionError> {
        let token = token.into();

        match self.codec.decode(&token) {
            Ok(identity) => {
                self.storage.store(&token)?;
                *self.write() = Session::authenticated(Credential::new(token), identity.clone());
                tracing::info!("Session committed for {} ({})", identity.id, identity.role);
                Ok(identity)
            }
            Err(e) => {
                *self.write() = Session::empty();
                discard(self.storage.as_ref());
                tracing::warn!("Rejected credential, session cleared: {}", e);
                Err(SessionError::Decode(e))
            }
        }
    }

    /// Log out: empty the durable copy, then the session.
    ///
    /// If the durable copy cannot be removed the session is kept, so memory
    /// never disagrees with what the next `initialize` would restore.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove()?;
        *self.write() = Session::empty();
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Session {
        self.read().clone()
    }

    pub fn identity(&self) -> Option<Claims> {
        self.read().identity().cloned()
    }

    pub fn token(&self) -> Option<Credential> {
        self.read().token().cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.read())
            .finish_non_exhaustive()
    }
}

fn discard(storage: &dyn TokenStorage) {
    if let Err(e) = storage.remove() {
        tracing::warn!("Unable to clear persisted credential: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::types::Role;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(id: &str, role: &str) -> String {
        encode(
            &Header::default(),
            &json!({"id": id, "role": role, "iat": 1_700_000_000}),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    fn store_with(storage: Arc<MemoryTokenStorage>) -> SessionStore {
        SessionStore::with_storage(storage)
    }

    #[test]
    fn starts_empty_without_persisted_token() {
        let store = store_with(Arc::new(MemoryTokenStorage::new()));
        assert_eq!(store.current(), Session::empty());
    }

    #[test]
    fn restores_valid_persisted_token() {
        let storage = Arc::new(MemoryTokenStorage::with_token(token("u1", "staff")));
        let store = store_with(storage.clone());

        let session = store.current();
        assert_eq!(session.identity().unwrap().id, "u1");
        assert_eq!(session.identity().unwrap().role, Role::Staff);
        assert!(session.token().is_some());
        assert!(storage.peek().is_some());
    }

    #[test]
    fn clears_stale_persisted_token() {
        let storage = Arc::new(MemoryTokenStorage::with_token("abc.def"));
        let store = store_with(storage.clone());

        assert!(!store.current().is_authenticated());
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn commit_replaces_session_and_persists() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_with(storage.clone());

        let admin = token("a1", "admin");
        let claims = store.commit(admin.clone()).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(store.token().unwrap().as_str(), admin);
        assert_eq!(storage.peek(), Some(admin));

        let staff = token("u1", "staff");
        store.commit(staff.clone()).unwrap();
        assert_eq!(store.identity().unwrap().id, "u1");
        assert_eq!(storage.peek(), Some(staff));
    }

    #[test]
    fn failed_commit_empties_everything() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_with(storage.clone());
        store.commit(token("a1", "admin")).unwrap();

        let err = store.commit("abc.def").unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));

        let session = store.current();
        assert!(session.token().is_none());
        assert!(session.identity().is_none());
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn clear_empties_session_and_storage() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_with(storage.clone());
        store.commit(token("u1", "staff")).unwrap();

        store.clear().unwrap();
        assert!(!store.current().is_authenticated());
        assert_eq!(storage.peek(), None);
    }

    /// Holds a token but refuses to delete it
    struct StickyStorage(MemoryTokenStorage);

    impl TokenStorage for StickyStorage {
        fn load(&self) -> Result<Option<String>, StorageError> {
            self.0.load()
        }

        fn store(&self, token: &str) -> Result<(), StorageError> {
            self.0.store(token)
        }

        fn remove(&self) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn failed_clear_keeps_session_matching_storage() {
        let storage = Arc::new(StickyStorage(MemoryTokenStorage::new()));
        let store = SessionStore::with_storage(storage.clone());
        store.commit(token("u1", "staff")).unwrap();

        assert!(matches!(store.clear(), Err(StorageError::Io(_))));
        assert_eq!(store.identity().unwrap().id, "u1");

        let restored = SessionStore::with_storage(storage);
        assert_eq!(restored.identity(), store.identity());
    }

    #[test]
    fn clones_share_state() {
        let store = store_with(Arc::new(MemoryTokenStorage::new()));
        let other = store.clone();
        store.commit(token("u1", "staff")).unwrap();
        assert_eq!(other.identity().unwrap().id, "u1");
    }

    #[test]
    fn reinitialize_reflects_latest_commit() {
        let storage = Arc::new(MemoryTokenStorage::new());
        store_with(storage.clone()).commit(token("a1", "admin")).unwrap();

        let restored = store_with(storage.clone());
        assert_eq!(restored.identity().unwrap().id, "a1");

        restored.clear().unwrap();
        assert!(!store_with(storage).current().is_authenticated());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let store = store_with(Arc::new(MemoryTokenStorage::new()));
        let raw = token("u1", "staff");
        store.commit(raw.clone()).unwrap();
        assert!(!format!("{:?}", store).contains(&raw));
    }
}
