//! Session persistence backends.

use dashmap::DashMap;

use super::{SessionData, SessionId};
use crate::api_error::ApiError;

/// A storage backend failure (connection lost, serialization, ...).
#[derive(Debug, Clone, thiserror::Error)]
#[error("session store: {0}")]
pub struct StoreError(pub String);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::service_unavailable("Session storage unavailable").with_context("cause", e.0)
    }
}

/// Where session records live between requests.
///
/// Implementations must be safe to call concurrently for different ids.
/// Concurrent writes to the *same* id are last-writer-wins.
pub trait SessionStore: Send + Sync + 'static {
    fn load(&self, id: &SessionId) -> Result<Option<SessionData>, StoreError>;
    fn save(&self, id: &SessionId, data: &SessionData) -> Result<(), StoreError>;
    fn remove(&self, id: &SessionId) -> Result<(), StoreError>;
}

/// In-process store, sharded by `dashmap`. Records vanish on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<SessionId, SessionData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &SessionId) -> Result<Option<SessionData>, StoreError> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    fn save(&self, id: &SessionId, data: &SessionData) -> Result<(), StoreError> {
        self.records.insert(id.clone(), data.clone());
        Ok(())
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        self.records.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_remove() {
        let store = MemoryStore::new();
        let id = SessionId::from("abc");
        assert_eq!(store.load(&id).unwrap(), None);

        let data = SessionData { user_id: Some("u-1".into()), ..SessionData::default() };
        store.save(&id, &data).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(data));
        assert_eq!(store.len(), 1);

        store.remove(&id).unwrap();
        assert!(store.is_empty());
    }
}
