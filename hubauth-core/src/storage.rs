//! Storage capability handed to operation modules.
//!
//! The controller never opens or closes storage; it passes the [`Provider`]
//! through unchanged. Modules open the named stores they need and own the
//! access discipline for them.

use std::sync::Arc;

use dashmap::DashMap;

/// Errors raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No value is stored under the key.
    NotFound,
    /// The backend itself failed (connection, I/O, ...).
    Backend(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound => write!(f, "data not found"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// A key-value store opened from a [`Provider`].
pub trait Store: Send + Sync {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Returns [`StorageError::NotFound`] when the key is absent.
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Remove `key` and return its value in one atomic step, or `None` when
    /// absent. Of several concurrent takes on one key, at most one sees the
    /// value.
    fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Opens named stores. Implementations must be safe to share across every
/// module built from the same configuration.
///
/// Implement this trait to back hub-auth with your own storage (SQL, Redis,
/// CouchDB, ...).
pub trait Provider: Send + Sync + 'static {
    /// Open (creating if needed) the store called `name`.
    ///
    /// Opening the same name twice yields the same underlying store.
    fn open_store(&self, name: &str) -> Result<Arc<dyn Store>, StorageError>;
}

/// In-memory store for development and testing.
#[derive(Default)]
pub struct MemStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemStore {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or(StorageError::NotFound)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.remove(key).map(|(_, value)| value))
    }
}

/// In-memory provider for development and testing.
///
/// Stores live as long as the provider; nothing is persisted.
#[derive(Default)]
pub struct MemProvider {
    stores: DashMap<String, Arc<MemStore>>,
}

impl MemProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning the provider behind an `Arc`, the
    /// shape operation configs expect.
    pub fn shared() -> Arc<dyn Provider> {
        Arc::new(Self::new())
    }

    /// Names of the stores opened so far.
    pub fn store_names(&self) -> Vec<String> {
        self.stores.iter().map(|e| e.key().clone()).collect()
    }
}

impl Provider for MemProvider {
    fn open_store(&self, name: &str) -> Result<Arc<dyn Store>, StorageError> {
        let store: Arc<dyn Store> = self
            .stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemStore::new()))
            .value()
            .clone();
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let store = MemStore::new();
        store.put("k", b"v".to_vec()).unwrap();
        assert_eq!(store.get("k").unwrap(), b"v");

        store.delete("k").unwrap();
        assert_eq!(store.get("k"), Err(StorageError::NotFound));
        // second delete is a no-op
        store.delete("k").unwrap();
    }

    #[test]
    fn take_removes_once() {
        let store = MemStore::new();
        store.put("k", b"v".to_vec()).unwrap();

        assert_eq!(store.take("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.take("k").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn same_name_same_store() {
        let provider = MemProvider::new();
        let a = provider.open_store("state").unwrap();
        let b = provider.open_store("state").unwrap();

        a.put("x", vec![1]).unwrap();
        assert_eq!(b.get("x").unwrap(), vec![1]);
        assert_eq!(provider.store_names(), vec!["state".to_string()]);
    }

    #[test]
    fn distinct_names_are_isolated() {
        let provider = MemProvider::new();
        let a = provider.open_store("a").unwrap();
        let b = provider.open_store("b").unwrap();

        a.put("x", vec![1]).unwrap();
        assert_eq!(b.get("x"), Err(StorageError::NotFound));
    }
}
