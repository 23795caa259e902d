use std::sync::Arc;

use hubauth_core::storage::{Provider, StorageError, Store};
use uuid::Uuid;

/// Name of the store holding pending authorization states.
pub const STATE_STORE_NAME: &str = "hubauth_oidc_state";

/// Single-use OAuth `state` values, kept in a provider-backed store between
/// the authorization redirect and the callback.
#[derive(Clone)]
pub(crate) struct StateStore {
    store: Arc<dyn Store>,
}

impl StateStore {
    pub fn open(provider: &dyn Provider) -> Result<Self, StorageError> {
        Ok(Self {
            store: provider.open_store(STATE_STORE_NAME)?,
        })
    }

    /// Generate and remember a fresh state for a request asking for `scope`.
    pub fn issue(&self, scope: &str) -> Result<String, StorageError> {
        let state = Uuid::new_v4().to_string();
        self.store.put(&state, scope.as_bytes().to_vec())?;
        Ok(state)
    }

    /// Remove `state`, returning whether it was pending. Concurrent callers
    /// racing on one state get `true` at most once.
    pub fn consume(&self, state: &str) -> Result<bool, StorageError> {
        Ok(self.store.take(state)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::time::Duration;

    use hubauth_core::storage::MemStore;
    use hubauth_core::MemProvider;

    use super::*;

    #[test]
    fn states_are_single_use() {
        let provider = MemProvider::new();
        let states = StateStore::open(&provider).unwrap();

        let state = states.issue("profile").unwrap();
        assert!(states.consume(&state).unwrap());
        assert!(!states.consume(&state).unwrap());
        assert!(!states.consume("never-issued").unwrap());
    }

    /// Store with backend latency on every read, to widen any window
    /// between checking and removing a key.
    struct SlowStore(MemStore);

    impl Store for SlowStore {
        fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
            self.0.put(key, value)
        }

        fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            std::thread::sleep(Duration::from_millis(50));
            self.0.get(key)
        }

        fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.0.delete(key)
        }

        fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            std::thread::sleep(Duration::from_millis(50));
            self.0.take(key)
        }
    }

    struct SlowProvider(Arc<SlowStore>);

    impl Provider for SlowProvider {
        fn open_store(&self, _name: &str) -> Result<Arc<dyn Store>, StorageError> {
            let store: Arc<dyn Store> = self.0.clone();
            Ok(store)
        }
    }

    #[test]
    fn concurrent_consumers_accept_a_state_once() {
        let provider = SlowProvider(Arc::new(SlowStore(MemStore::new())));
        let states = StateStore::open(&provider).unwrap();
        let state = states.issue("profile").unwrap();

        let barrier = Arc::new(Barrier::new(4));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let states = states.clone();
                let state = state.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    states.consume(&state).unwrap()
                })
            })
            .collect();

        let accepted = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
    }

    #[test]
    fn states_are_unique_and_shared_through_the_provider() {
        let provider = MemProvider::new();
        let a = StateStore::open(&provider).unwrap();
        let b = StateStore::open(&provider).unwrap();

        let first = a.issue("x").unwrap();
        let second = a.issue("x").unwrap();
        assert_ne!(first, second);
        assert!(b.consume(&first).unwrap());
        assert_eq!(provider.store_names(), vec![STATE_STORE_NAME.to_string()]);
    }
}
