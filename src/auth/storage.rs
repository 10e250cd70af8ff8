use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable home of the last-issued bearer token.
///
/// Holds exactly one key. Removing an absent key is not an error.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn store(&self, token: &str) -> Result<(), StorageError>;
    fn remove(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token persisted as a small JSON document in the CLI config directory
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub const FILE_NAME: &'static str = "auth.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let stored: StoredCredential = serde_json::from_str(&content)?;
        Ok(Some(stored.token))
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let stored = StoredCredential {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage for embedders and tests
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    /// Current stored value, for assertions
    pub fn peek(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot().clone())
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::in_dir(dir.path());

        assert_eq!(storage.load().unwrap(), None);
        storage.store("a.b.c").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("a.b.c"));

        storage.remove().unwrap();
        assert_eq!(storage.load().unwrap(), None);
        // removing again is a no-op
        storage.remove().unwrap();
    }

    #[test]
    fn file_storage_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::in_dir(&dir.path().join("nested").join("cli"));
        storage.store("tok").unwrap();
        assert!(storage.path().exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::in_dir(dir.path());
        fs::write(storage.path(), "not json").unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Corrupt(_))));
    }
}
