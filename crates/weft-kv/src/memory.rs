use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{KvError, KvResult};
use crate::traits::KvStore;
use crate::MAX_KEY_LEN;

/// In-memory, BTreeMap-based key-value store.
///
/// The backing `BTreeMap` keeps keys in ascending byte order, which makes
/// `scan_prefix` a stable total order for free. Intended for tests and
/// embedding; all entries are held in memory behind a `RwLock`.
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    /// Snapshot of the full contents, in ascending key order.
    ///
    /// Test helper for comparing whole-store state after delta replays.
    pub fn dump(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_key(key: &[u8]) -> KvResult<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(KvError::KeyTooLong {
            max: MAX_KEY_LEN,
            actual: key.len(),
        });
    }
    Ok(())
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<bool> {
        check_key(key)?;
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.insert(key.to_vec(), value.to_vec()).is_some())
    }

    fn delete(&self, key: &[u8]) -> KvResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn remove_prefix(&self, prefix: &[u8]) -> KvResult<u64> {
        let mut map = self.entries.write().expect("lock poisoned");
        let doomed: Vec<Vec<u8>> = map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            map.remove(key);
        }
        Ok(doomed.len() as u64)
    }
}

impl std::fmt::Debug for MemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKvStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
