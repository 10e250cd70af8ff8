use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use super::{PermissionSet, PermissionSource, Resolution};
use crate::auth::{Claims, SessionStore};
use crate::error::ClientError;
use crate::types::Role;

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("Failed to fetch permissions for {staff_id}: {source}")]
    Fetch {
        staff_id: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to save permissions for {staff_id}: {source}")]
    Store {
        staff_id: String,
        #[source]
        source: ClientError,
    },

    #[error("Discarded permissions for {staff_id}: session changed while fetching")]
    Stale { staff_id: String },
}

/// A cached resolution stamped with the write that produced it
#[derive(Debug)]
struct Entry {
    resolution: Resolution,
    generation: u64,
}

/// Fetches and caches staff permission flags.
///
/// Admins never reach the network. Staff flags start fail-closed and only
/// ever hold the latest value the server returned. A fetch only lands if no
/// other write touched the same entry while it was in flight.
pub struct PermissionResolver {
    source: Arc<dyn PermissionSource>,
    session: SessionStore,
    cache: Mutex<HashMap<String, Entry>>,
    generation: AtomicU64,
}

impl PermissionResolver {
    pub fn new(source: Arc<dyn PermissionSource>, session: SessionStore) -> Self {
        Self {
            source,
            session,
            cache: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Flags in force right now, without touching the network
    pub fn effective(&self, identity: &Claims) -> PermissionSet {
        match identity.role {
            Role::Admin => PermissionSet::all(),
            Role::Staff => self
                .cache()
                .get(&identity.id)
                .map(|entry| entry.resolution.effective())
                .unwrap_or_else(PermissionSet::none),
        }
    }

    pub fn status(&self, staff_id: &str) -> Option<Resolution> {
        self.cache().get(staff_id).map(|entry| entry.resolution.clone())
    }

    /// Flags for the given identity, fetching only if nothing is resolved yet
    pub async fn resolve(&self, identity: &Claims) -> Result<PermissionSet, PermissionError> {
        match identity.role {
            Role::Admin => Ok(PermissionSet::all()),
            Role::Staff => {
                if let Some(Resolution::Resolved(set)) = self.status(&identity.id) {
                    tracing::debug!("Permission cache hit for {}", identity.id);
                    return Ok(set);
                }
                self.fetch_for_session(identity).await
            }
        }
    }

    /// Like `resolve`, but always asks the server for staff identities
    pub async fn refresh(&self, identity: &Claims) -> Result<PermissionSet, PermissionError> {
        match identity.role {
            Role::Admin => Ok(PermissionSet::all()),
            Role::Staff => self.fetch_for_session(identity).await,
        }
    }

    /// Admin-side read of a staff member's flags for the permissions editor
    pub async fn lookup(&self, staff_id: &str) -> Result<PermissionSet, PermissionError> {
        match self.source.fetch_permissions(staff_id).await {
            Ok(set) => {
                self.set(staff_id, Resolution::Resolved(set));
                Ok(set)
            }
            Err(source) => {
                tracing::warn!("Permission lookup for {} failed: {}", staff_id, source);
                self.set(staff_id, Resolution::Failed(source.to_string()));
                Err(PermissionError::Fetch {
                    staff_id: staff_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Admin-side write; on success the cached entry is replaced by what was written
    pub async fn update(
        &self,
        staff_id: &str,
        permissions: PermissionSet,
    ) -> Result<(), PermissionError> {
        self.source
            .store_permissions(staff_id, permissions)
            .await
            .map_err(|source| PermissionError::Store {
                staff_id: staff_id.to_string(),
                source,
            })?;

        self.set(staff_id, Resolution::Resolved(permissions));
        tracing::info!("Updated permissions for {}", staff_id);
        Ok(())
    }

    pub fn invalidate(&self, staff_id: &str) {
        self.cache().remove(staff_id);
    }

    pub fn clear(&self) {
        self.cache().clear();
    }

    async fn fetch_for_session(&self, identity: &Claims) -> Result<PermissionSet, PermissionError> {
        let staff_id = identity.id.clone();
        let ticket = self.set(&staff_id, Resolution::Pending);

        let result = self.source.fetch_permissions(&staff_id).await;

        let still_current = self
            .session
            .identity()
            .map(|current| current.same_identity(identity))
            .unwrap_or(false);

        let mut cache = self.cache();
        let owns_entry = cache.get(&staff_id).map(|entry| entry.generation) == Some(ticket);

        if !still_current {
            tracing::debug!("Discarding permission fetch for {}: session changed", staff_id);
            if owns_entry {
                cache.remove(&staff_id);
            }
            return Err(PermissionError::Stale { staff_id });
        }

        if !owns_entry {
            // An update, lookup or invalidate landed first; keep what it wrote
            tracing::debug!("Permission fetch for {} superseded", staff_id);
            if let Some(Entry { resolution: Resolution::Resolved(set), .. }) = cache.get(&staff_id) {
                return Ok(*set);
            }
            return result.map_err(|source| PermissionError::Fetch { staff_id, source });
        }

        let generation = self.next_generation();
        match result {
            Ok(set) => {
                cache.insert(staff_id, Entry { resolution: Resolution::Resolved(set), generation });
                Ok(set)
            }
            Err(source) => {
                tracing::warn!("Permission fetch for {} failed: {}", staff_id, source);
                let resolution = Resolution::Failed(source.to_string());
                cache.insert(staff_id.clone(), Entry { resolution, generation });
                Err(PermissionError::Fetch { staff_id, source })
            }
        }
    }

    /// Store a resolution and return the generation it was stamped with
    fn set(&self, staff_id: &str, resolution: Resolution) -> u64 {
        let generation = self.next_generation();
        self.cache().insert(staff_id.to_string(), Entry { resolution, generation });
        generation
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
