use weft_crypto::ContentHasher;
use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_USER};
use weft_types::{ExecutorId, RecordId, StorageId};

use crate::error::ContentResult;

/// Per-user record storage.
///
/// A `UserStore` handle is bound to one storage instance. Each user key
/// owns at most one record inside it; `insert` overwrites the caller's own
/// record. Own-access and cross-user operations are separate methods so
/// the capability split survives to the host boundary, where access
/// control can gate them independently.
pub struct UserStore<'s> {
    store: &'s dyn KvStore,
    id: StorageId,
}

impl<'s> UserStore<'s> {
    /// Attach to the user-storage instance `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: StorageId) -> Self {
        Self { store, id }
    }

    /// The instance id.
    pub fn id(&self) -> &StorageId {
        &self.id
    }

    /// Insert or overwrite `user`'s record. Returns the record's id.
    pub fn insert(&self, user: &ExecutorId, value: &[u8]) -> ContentResult<RecordId> {
        self.store.put(&self.key_for(user), value)?;
        Ok(self.record_id(user))
    }

    /// Read `user`'s own latest record.
    pub fn get(&self, user: &ExecutorId) -> ContentResult<Option<Vec<u8>>> {
        Ok(self.store.get(&self.key_for(user))?)
    }

    /// Read another principal's record.
    ///
    /// Identical storage semantics to [`get`](Self::get); kept separate so
    /// callers can be gated differently for cross-user access.
    pub fn get_for_user(&self, user_key: &ExecutorId) -> ContentResult<Option<Vec<u8>>> {
        self.get(user_key)
    }

    /// Remove `user`'s record. Returns `true` if one existed.
    pub fn remove(&self, user: &ExecutorId) -> ContentResult<bool> {
        Ok(self.store.delete(&self.key_for(user))?)
    }

    /// Check whether `user` has a record, without retrieving it.
    pub fn contains(&self, user: &ExecutorId) -> ContentResult<bool> {
        Ok(self.store.contains(&self.key_for(user))?)
    }

    /// Check whether another principal has a record.
    pub fn contains_user(&self, user_key: &ExecutorId) -> ContentResult<bool> {
        self.contains(user_key)
    }

    /// The derived identity of `user`'s record in this instance.
    pub fn record_id(&self, user: &ExecutorId) -> RecordId {
        RecordId::from_array(
            ContentHasher::RECORD.hash_pair(self.id.as_bytes(), user.as_bytes()),
        )
    }

    fn key_for(&self, user: &ExecutorId) -> Vec<u8> {
        keyspace::entity_key(TAG_USER, self.id.as_bytes(), user.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_kv::MemoryKvStore;

    fn storage(byte: u8) -> StorageId {
        StorageId::from_array([byte; 32])
    }

    fn user(byte: u8) -> ExecutorId {
        ExecutorId::from_array([byte; 32])
    }

    #[test]
    fn insert_get_roundtrip() {
        let kv = MemoryKvStore::new();
        let store = UserStore::open(&kv, storage(1));
        store.insert(&user(1), b"mine").unwrap();
        assert_eq!(store.get(&user(1)).unwrap(), Some(b"mine".to_vec()));
    }

    #[test]
    fn insert_overwrites_own_record() {
        let kv = MemoryKvStore::new();
        let store = UserStore::open(&kv, storage(1));
        store.insert(&user(1), b"v1").unwrap();
        store.insert(&user(1), b"v2").unwrap();
        assert_eq!(store.get(&user(1)).unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn users_are_isolated_within_an_instance() {
        let kv = MemoryKvStore::new();
        let store = UserStore::open(&kv, storage(1));
        store.insert(&user(1), b"one").unwrap();
        store.insert(&user(2), b"two").unwrap();
        assert_eq!(store.get(&user(1)).unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get_for_user(&user(2)).unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn instances_are_isolated() {
        let kv = MemoryKvStore::new();
        let a = UserStore::open(&kv, storage(1));
        let b = UserStore::open(&kv, storage(2));
        a.insert(&user(1), b"in a").unwrap();
        assert_eq!(b.get(&user(1)).unwrap(), None);
        assert!(!b.contains(&user(1)).unwrap());
    }

    #[test]
    fn contains_is_independent_of_retrieval() {
        let kv = MemoryKvStore::new();
        let store = UserStore::open(&kv, storage(1));
        assert!(!store.contains(&user(1)).unwrap());
        assert!(!store.contains_user(&user(2)).unwrap());
        store.insert(&user(1), b"").unwrap();
        // An empty value still counts as a record.
        assert!(store.contains(&user(1)).unwrap());
    }

    #[test]
    fn remove_reports_presence() {
        let kv = MemoryKvStore::new();
        let store = UserStore::open(&kv, storage(1));
        store.insert(&user(1), b"v").unwrap();
        assert!(store.remove(&user(1)).unwrap());
        assert!(!store.remove(&user(1)).unwrap());
        assert_eq!(store.get(&user(1)).unwrap(), None);
    }

    #[test]
    fn record_id_is_stable_and_distinct() {
        let kv = MemoryKvStore::new();
        let store = UserStore::open(&kv, storage(1));
        let id1 = store.insert(&user(1), b"v1").unwrap();
        let id2 = store.insert(&user(1), b"v2").unwrap();
        // Same instance + user => same record id, regardless of value.
        assert_eq!(id1, id2);
        // Different user or instance => different record id.
        assert_ne!(id1, store.record_id(&user(2)));
        let other = UserStore::open(&kv, storage(2));
        assert_ne!(id1, other.record_id(&user(1)));
    }
}
