use crate::error::KvResult;

/// Byte-string key-value store.
///
/// All implementations must satisfy these invariants:
/// - Writes are immediately visible to subsequent reads (read-your-writes
///   within an execution).
/// - `scan_prefix` enumerates entries in ascending byte order of the full
///   key — a stable total order, identical across replicas holding the
///   same state.
/// - Keys longer than [`crate::MAX_KEY_LEN`] are rejected at `put`.
/// - The store never interprets keys or values.
pub trait KvStore: Send + Sync {
    /// Read the value for a key. Returns `None` if absent.
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    /// Write a value. Returns `true` if a previous value existed.
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<bool>;

    /// Remove a key. Returns `true` if a previous value existed.
    fn delete(&self, key: &[u8]) -> KvResult<bool>;

    /// Check whether a key exists.
    ///
    /// Default implementation uses `get()`; backends may avoid copying the
    /// value.
    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed. Higher layers use this to
    /// clear a whole entity in one operation.
    fn remove_prefix(&self, prefix: &[u8]) -> KvResult<u64>;
}
