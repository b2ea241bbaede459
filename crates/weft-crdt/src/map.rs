use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_MAP};

use crate::error::CrdtResult;

/// Byte-keyed replicated map.
///
/// A handle over a store and an entity id; each map key lives at
/// `[TAG_MAP][id][key]` in the backing store. Iteration enumerates live
/// entries in ascending byte order of the map key — a stable total order
/// identical on every replica holding the same state.
pub struct CrdtMap<'s> {
    store: &'s dyn KvStore,
    id: Vec<u8>,
}

impl<'s> CrdtMap<'s> {
    /// Attach to the map entity `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }

    /// The entity id of this map.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Insert or overwrite a key. Returns the previous value, if any.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> CrdtResult<Option<Vec<u8>>> {
        let storage_key = self.key_for(key);
        let previous = self.store.get(&storage_key)?;
        self.store.put(&storage_key, value)?;
        Ok(previous)
    }

    /// Read the value for a key.
    pub fn get(&self, key: &[u8]) -> CrdtResult<Option<Vec<u8>>> {
        Ok(self.store.get(&self.key_for(key))?)
    }

    /// Remove a key. Returns the removed value, or `None` if absent
    /// (removal of an absent key is a no-op, not an error).
    pub fn remove(&self, key: &[u8]) -> CrdtResult<Option<Vec<u8>>> {
        let storage_key = self.key_for(key);
        let previous = self.store.get(&storage_key)?;
        if previous.is_some() {
            self.store.delete(&storage_key)?;
        }
        Ok(previous)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &[u8]) -> CrdtResult<bool> {
        Ok(self.store.contains(&self.key_for(key))?)
    }

    /// Number of live entries.
    pub fn len(&self) -> CrdtResult<usize> {
        Ok(self.store.scan_prefix(&self.prefix())?.len())
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> CrdtResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of all live `(key, value)` pairs in ascending key order.
    ///
    /// Restartable: calling again yields a fresh enumeration reflecting
    /// any mutations made in between.
    pub fn entries(&self) -> CrdtResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix = self.prefix();
        Ok(self
            .store
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(k, v)| (k[prefix.len()..].to_vec(), v))
            .collect())
    }

    /// Iterate over a snapshot of live entries in ascending key order.
    pub fn iter(&self) -> CrdtResult<impl Iterator<Item = (Vec<u8>, Vec<u8>)>> {
        Ok(self.entries()?.into_iter())
    }

    fn prefix(&self) -> Vec<u8> {
        keyspace::entity_prefix(TAG_MAP, &self.id)
    }

    fn key_for(&self, key: &[u8]) -> Vec<u8> {
        keyspace::entity_key(TAG_MAP, &self.id, key)
    }
}
