use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_SET};

use crate::error::CrdtResult;

/// Replicated membership set.
///
/// Members are stored as map-style keys with empty values, so membership
/// semantics and iteration order are identical to [`crate::CrdtMap`] keys.
/// `clear` removes the whole entity with a single prefix removal — one
/// delta entry regardless of cardinality.
pub struct CrdtSet<'s> {
    store: &'s dyn KvStore,
    id: Vec<u8>,
}

impl<'s> CrdtSet<'s> {
    /// Attach to the set entity `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }

    /// The entity id of this set.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Add a member. Returns `true` if it was newly inserted.
    pub fn insert(&self, member: &[u8]) -> CrdtResult<bool> {
        let existed = self.store.put(&self.key_for(member), b"")?;
        Ok(!existed)
    }

    /// Check membership.
    pub fn contains(&self, member: &[u8]) -> CrdtResult<bool> {
        Ok(self.store.contains(&self.key_for(member))?)
    }

    /// Remove a member. Returns `true` if it was present.
    pub fn remove(&self, member: &[u8]) -> CrdtResult<bool> {
        Ok(self.store.delete(&self.key_for(member))?)
    }

    /// Number of members.
    pub fn len(&self) -> CrdtResult<usize> {
        Ok(self.store.scan_prefix(&self.prefix())?.len())
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> CrdtResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of all members in ascending byte order.
    pub fn members(&self) -> CrdtResult<Vec<Vec<u8>>> {
        let prefix = self.prefix();
        Ok(self
            .store
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(k, _)| k[prefix.len()..].to_vec())
            .collect())
    }

    /// Iterate over a snapshot of members in ascending byte order.
    pub fn iter(&self) -> CrdtResult<impl Iterator<Item = Vec<u8>>> {
        Ok(self.members()?.into_iter())
    }

    /// Remove all members in one operation.
    ///
    /// Returns the number removed.
    pub fn clear(&self) -> CrdtResult<u64> {
        Ok(self.store.remove_prefix(&self.prefix())?)
    }

    fn prefix(&self) -> Vec<u8> {
        keyspace::entity_prefix(TAG_SET, &self.id)
    }

    fn key_for(&self, member: &[u8]) -> Vec<u8> {
        keyspace::entity_key(TAG_SET, &self.id, member)
    }
}
