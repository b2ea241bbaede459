use tracing::debug;
use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_FROZEN};
use weft_types::StorageId;

use crate::error::ContentResult;

/// Content-addressed immutable record storage.
///
/// Records are indexed by a 32-byte hash computed over the value by the
/// caller side of the boundary — this engine never hashes, it only
/// indexes. Once a hash is present its record is never replaced: `add` is
/// idempotent and re-adding identical content cannot corrupt prior state.
pub struct FrozenStore<'s> {
    store: &'s dyn KvStore,
    id: StorageId,
}

impl<'s> FrozenStore<'s> {
    /// Attach to the frozen-storage instance `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: StorageId) -> Self {
        Self { store, id }
    }

    /// The instance id.
    pub fn id(&self) -> &StorageId {
        &self.id
    }

    /// Add a record under `hash`. Returns `true` if it was newly added.
    ///
    /// If the hash is already present the stored record is left untouched,
    /// whatever `value` carries — content addressing makes the first write
    /// authoritative.
    pub fn add(&self, hash: &[u8; 32], value: &[u8]) -> ContentResult<bool> {
        let key = self.key_for(hash);
        if self.store.contains(&key)? {
            debug!(hash = %hex_preview(hash), "frozen record already present");
            return Ok(false);
        }
        self.store.put(&key, value)?;
        Ok(true)
    }

    /// Read the record under `hash`.
    pub fn get(&self, hash: &[u8; 32]) -> ContentResult<Option<Vec<u8>>> {
        Ok(self.store.get(&self.key_for(hash))?)
    }

    /// Check whether a record exists under `hash`.
    pub fn contains(&self, hash: &[u8; 32]) -> ContentResult<bool> {
        Ok(self.store.contains(&self.key_for(hash))?)
    }

    fn key_for(&self, hash: &[u8; 32]) -> Vec<u8> {
        keyspace::entity_key(TAG_FROZEN, self.id.as_bytes(), hash)
    }
}

fn hex_preview(hash: &[u8; 32]) -> String {
    hash.iter().take(4).map(|b| format!("{b:02x}")).collect()
}
