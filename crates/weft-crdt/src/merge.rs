use tracing::warn;
use weft_delta::Merge;
use weft_types::keyspace::{self, TAG_COUNTER, TAG_LWW};

use crate::lww::LwwRecord;

/// Value-level merge rules for foreign-delta replay.
///
/// [`weft_delta::CommitManager::apply_storage_delta`] routes every incoming
/// `Put` through this policy:
///
/// - **LWW register records** merge by record comparison — the stored
///   winner survives unless the incoming record beats it under
///   `(timestamp, writer)`.
/// - **Counter shards** merge by `max` — shard counts only grow, so the
///   larger count is always the more recent observation of that executor.
/// - **Everything else** takes the incoming value; map, set, and vector
///   operations carry their union semantics in the operations themselves.
///
/// A stored record that fails to decode is treated as absent (the incoming
/// value wins) rather than aborting replay; the condition is logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrdtMerge;

impl Merge for CrdtMerge {
    fn merge(&self, key: &[u8], existing: Option<&[u8]>, incoming: &[u8]) -> Vec<u8> {
        let Some(existing) = existing else {
            return incoming.to_vec();
        };
        match keyspace::tag_of(key) {
            Some(TAG_LWW) => merge_lww(existing, incoming),
            Some(TAG_COUNTER) => merge_shard(existing, incoming),
            _ => incoming.to_vec(),
        }
    }
}

fn merge_lww(existing: &[u8], incoming: &[u8]) -> Vec<u8> {
    let (current, candidate) = match (LwwRecord::decode(existing), LwwRecord::decode(incoming)) {
        (Ok(current), Ok(candidate)) => (current, candidate),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "undecodable LWW record during replay, taking incoming");
            return incoming.to_vec();
        }
    };
    if candidate.wins_over(&current) {
        incoming.to_vec()
    } else {
        existing.to_vec()
    }
}

fn merge_shard(existing: &[u8], incoming: &[u8]) -> Vec<u8> {
    let (Ok(current), Ok(candidate)) = (
        <[u8; 8]>::try_from(existing),
        <[u8; 8]>::try_from(incoming),
    ) else {
        warn!("undecodable counter shard during replay, taking incoming");
        return incoming.to_vec();
    };
    let merged = u64::from_le_bytes(current).max(u64::from_le_bytes(candidate));
    merged.to_le_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_types::keyspace::{entity_key, entity_prefix, TAG_MAP};
    use weft_types::ExecutorId;

    fn lww_bytes(value: &[u8], timestamp_ns: u64, writer: u8) -> Vec<u8> {
        LwwRecord {
            value: Some(value.to_vec()),
            timestamp_ns,
            writer: ExecutorId::from_array([writer; 32]),
        }
        .encode()
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // LWW keys
    // -----------------------------------------------------------------------

    #[test]
    fn lww_keeps_local_winner_over_stale_incoming() {
        let key = entity_prefix(TAG_LWW, b"r1");
        let local = lww_bytes(b"new", 200, 1);
        let stale = lww_bytes(b"old", 100, 1);
        assert_eq!(CrdtMerge.merge(&key, Some(&local), &stale), local);
    }

    #[test]
    fn lww_takes_newer_incoming() {
        let key = entity_prefix(TAG_LWW, b"r1");
        let local = lww_bytes(b"old", 100, 1);
        let newer = lww_bytes(b"new", 200, 1);
        assert_eq!(CrdtMerge.merge(&key, Some(&local), &newer), newer);
    }

    #[test]
    fn lww_tie_breaks_by_writer() {
        let key = entity_prefix(TAG_LWW, b"r1");
        let low = lww_bytes(b"low", 100, 1);
        let high = lww_bytes(b"high", 100, 2);
        assert_eq!(CrdtMerge.merge(&key, Some(&low), &high), high);
        assert_eq!(CrdtMerge.merge(&key, Some(&high), &low), high);
    }

    #[test]
    fn lww_undecodable_existing_takes_incoming() {
        let key = entity_prefix(TAG_LWW, b"r1");
        let incoming = lww_bytes(b"v", 100, 1);
        assert_eq!(CrdtMerge.merge(&key, Some(b"garbage"), &incoming), incoming);
    }

    // -----------------------------------------------------------------------
    // Counter shards
    // -----------------------------------------------------------------------

    #[test]
    fn counter_shard_merges_by_max() {
        let key = entity_key(TAG_COUNTER, b"c1", &[1u8; 32]);
        let five = 5u64.to_le_bytes().to_vec();
        let three = 3u64.to_le_bytes().to_vec();
        assert_eq!(CrdtMerge.merge(&key, Some(&five), &three), five);
        assert_eq!(CrdtMerge.merge(&key, Some(&three), &five), five);
    }

    // -----------------------------------------------------------------------
    // Plain keys
    // -----------------------------------------------------------------------

    #[test]
    fn plain_keys_take_incoming() {
        let key = entity_key(TAG_MAP, b"m1", b"k");
        assert_eq!(
            CrdtMerge.merge(&key, Some(b"local"), b"incoming"),
            b"incoming".to_vec()
        );
        assert_eq!(CrdtMerge.merge(b"", Some(b"local"), b"incoming"), b"incoming");
    }

    #[test]
    fn absent_existing_takes_incoming_for_any_tag() {
        let key = entity_prefix(TAG_LWW, b"r1");
        assert_eq!(CrdtMerge.merge(&key, None, b"anything"), b"anything");
    }

    // -----------------------------------------------------------------------
    // Determinism properties
    // -----------------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Merging two LWW records is commutative: the same winner
            /// survives no matter which replica applies whose delta.
            #[test]
            fn lww_merge_is_commutative(
                ts_a in 0u64..1_000_000,
                ts_b in 0u64..1_000_000,
                wa in 0u8..=255,
                wb in 0u8..=255,
                va in proptest::collection::vec(any::<u8>(), 0..16),
                vb in proptest::collection::vec(any::<u8>(), 0..16),
            ) {
                // Distinct (timestamp, writer) pairs identify distinct writes.
                prop_assume!((ts_a, wa) != (ts_b, wb));
                let key = entity_prefix(TAG_LWW, b"r");
                let a = lww_bytes(&va, ts_a, wa);
                let b = lww_bytes(&vb, ts_b, wb);
                let ab = CrdtMerge.merge(&key, Some(&a), &b);
                let ba = CrdtMerge.merge(&key, Some(&b), &a);
                prop_assert_eq!(ab, ba);
            }

            /// Shard merge is commutative and idempotent.
            #[test]
            fn shard_merge_is_commutative_and_idempotent(a in any::<u64>(), b in any::<u64>()) {
                let key = entity_key(TAG_COUNTER, b"c", &[0u8; 32]);
                let ab = CrdtMerge.merge(&key, Some(&a.to_le_bytes()), &b.to_le_bytes());
                let ba = CrdtMerge.merge(&key, Some(&b.to_le_bytes()), &a.to_le_bytes());
                prop_assert_eq!(&ab, &ba);
                let again = CrdtMerge.merge(&key, Some(&ab), &b.to_le_bytes());
                prop_assert_eq!(ab, again);
            }
        }
    }
}
