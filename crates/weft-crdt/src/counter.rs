use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_COUNTER};
use weft_types::ExecutorId;

use crate::error::{CrdtError, CrdtResult};

/// Grow-only counter sharded per executor.
///
/// Each executor increments only its own shard (stored u64-le at the field
/// named by the executor id), so concurrent increments from different
/// replicas never conflict. The global value is the sum of all shards.
pub struct Counter<'s> {
    store: &'s dyn KvStore,
    id: Vec<u8>,
}

impl<'s> Counter<'s> {
    /// Attach to the counter entity `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }

    /// The entity id of this counter.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Add 1 to `executor`'s shard. Returns the shard's new count.
    pub fn increment(&self, executor: &ExecutorId) -> CrdtResult<u64> {
        let key = self.shard_key(executor);
        let current = match self.store.get(&key)? {
            Some(bytes) => self.decode_shard(&bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.store.put(&key, &next.to_le_bytes())?;
        Ok(next)
    }

    /// The global value: sum of every executor's shard.
    pub fn value(&self) -> CrdtResult<u64> {
        let mut total = 0u64;
        for (_, bytes) in self.store.scan_prefix(&self.prefix())? {
            total += self.decode_shard(&bytes)?;
        }
        Ok(total)
    }

    /// One executor's shard count (0 if that executor never incremented).
    ///
    /// With `executor = None` this behaves like [`value`](Self::value) —
    /// the two queries share one operation at the host ABI, and that
    /// consolidation is kept here deliberately.
    pub fn executor_count(&self, executor: Option<&ExecutorId>) -> CrdtResult<u64> {
        match executor {
            Some(executor) => match self.store.get(&self.shard_key(executor))? {
                Some(bytes) => self.decode_shard(&bytes),
                None => Ok(0),
            },
            None => self.value(),
        }
    }

    fn prefix(&self) -> Vec<u8> {
        keyspace::entity_prefix(TAG_COUNTER, &self.id)
    }

    fn shard_key(&self, executor: &ExecutorId) -> Vec<u8> {
        keyspace::entity_key(TAG_COUNTER, &self.id, executor.as_bytes())
    }

    fn decode_shard(&self, bytes: &[u8]) -> CrdtResult<u64> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| CrdtError::CorruptRecord {
            entity: self.id.iter().map(|b| format!("{b:02x}")).collect(),
            reason: format!("shard is {} bytes, expected 8", bytes.len()),
        })?;
        Ok(u64::from_le_bytes(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_kv::MemoryKvStore;

    fn executor(byte: u8) -> ExecutorId {
        ExecutorId::from_array([byte; 32])
    }

    #[test]
    fn fresh_counter_is_zero() {
        let store = MemoryKvStore::new();
        let counter = Counter::open(&store, b"c1".to_vec());
        assert_eq!(counter.value().unwrap(), 0);
        assert_eq!(counter.executor_count(Some(&executor(1))).unwrap(), 0);
    }

    #[test]
    fn value_sums_across_executors() {
        let store = MemoryKvStore::new();
        let counter = Counter::open(&store, b"c1".to_vec());
        for _ in 0..3 {
            counter.increment(&executor(1)).unwrap();
        }
        for _ in 0..2 {
            counter.increment(&executor(2)).unwrap();
        }
        assert_eq!(counter.value().unwrap(), 5);
        assert_eq!(counter.executor_count(Some(&executor(1))).unwrap(), 3);
        assert_eq!(counter.executor_count(Some(&executor(2))).unwrap(), 2);
    }

    #[test]
    fn increment_returns_shard_count() {
        let store = MemoryKvStore::new();
        let counter = Counter::open(&store, b"c1".to_vec());
        assert_eq!(counter.increment(&executor(1)).unwrap(), 1);
        assert_eq!(counter.increment(&executor(1)).unwrap(), 2);
        assert_eq!(counter.increment(&executor(2)).unwrap(), 1);
    }

    #[test]
    fn omitted_executor_behaves_like_value() {
        let store = MemoryKvStore::new();
        let counter = Counter::open(&store, b"c1".to_vec());
        counter.increment(&executor(1)).unwrap();
        counter.increment(&executor(2)).unwrap();
        assert_eq!(counter.executor_count(None).unwrap(), counter.value().unwrap());
    }

    #[test]
    fn distinct_counters_are_isolated() {
        let store = MemoryKvStore::new();
        let c1 = Counter::open(&store, b"c1".to_vec());
        let c2 = Counter::open(&store, b"c2".to_vec());
        c1.increment(&executor(1)).unwrap();
        assert_eq!(c2.value().unwrap(), 0);
    }

    #[test]
    fn corrupt_shard_is_a_typed_error() {
        let store = MemoryKvStore::new();
        let counter = Counter::open(&store, b"c1".to_vec());
        let key = keyspace::entity_key(TAG_COUNTER, b"c1", executor(1).as_bytes());
        store.put(&key, b"nope").unwrap();
        assert!(matches!(
            counter.value().unwrap_err(),
            CrdtError::CorruptRecord { .. }
        ));
    }
}
