/// Value-level reconciliation seam for foreign-delta replay.
///
/// When [`crate::CommitManager::apply_storage_delta`] replays a `Put` from a
/// remote peer, the incoming value may conflict with a locally stored one.
/// Implementations decide, per key, which bytes survive. The CRDT layer
/// provides the real rules (LWW record comparison, counter-shard max);
/// [`LastWriteMerge`] is the trivial policy for plain keys.
///
/// Merge must be deterministic: the same `(key, existing, incoming)` triple
/// must produce the same bytes on every replica.
pub trait Merge: Send + Sync {
    /// Reconcile `incoming` with the `existing` stored value for `key`.
    fn merge(&self, key: &[u8], existing: Option<&[u8]>, incoming: &[u8]) -> Vec<u8>;
}

/// Replay policy that always takes the incoming value.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastWriteMerge;

impl Merge for LastWriteMerge {
    fn merge(&self, _key: &[u8], _existing: Option<&[u8]>, incoming: &[u8]) -> Vec<u8> {
        incoming.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_takes_incoming() {
        let merge = LastWriteMerge;
        assert_eq!(merge.merge(b"k", Some(b"old"), b"new"), b"new".to_vec());
        assert_eq!(merge.merge(b"k", None, b"new"), b"new".to_vec());
    }
}
