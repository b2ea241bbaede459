//! Key layout shared by every layer that persists through the KV store.
//!
//! A persisted key is `[kind tag][u32-be id length][id bytes][field bytes]`.
//! The id length prefix guarantees that no entity's keyspace is a prefix of
//! another's, so prefix scans and prefix removals are always exact. The KV
//! layer itself never interprets this structure.

/// Kind tag for CRDT maps.
pub const TAG_MAP: u8 = 0x01;
/// Kind tag for CRDT vectors.
pub const TAG_VECTOR: u8 = 0x02;
/// Kind tag for CRDT sets.
pub const TAG_SET: u8 = 0x03;
/// Kind tag for last-writer-wins registers.
pub const TAG_LWW: u8 = 0x04;
/// Kind tag for grow-only counters.
pub const TAG_COUNTER: u8 = 0x05;
/// Kind tag for user storage instances.
pub const TAG_USER: u8 = 0x06;
/// Kind tag for frozen storage instances.
pub const TAG_FROZEN: u8 = 0x07;
/// Kind tag for runtime metadata (root state, commit artifacts).
pub const TAG_META: u8 = 0x0F;

/// The prefix owning every key of the entity `id` under `tag`.
pub fn entity_prefix(tag: u8, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 4 + id.len());
    key.push(tag);
    key.extend_from_slice(&(id.len() as u32).to_be_bytes());
    key.extend_from_slice(id);
    key
}

/// The key of one field of the entity `id` under `tag`.
pub fn entity_key(tag: u8, id: &[u8], field: &[u8]) -> Vec<u8> {
    let mut key = entity_prefix(tag, id);
    key.extend_from_slice(field);
    key
}

/// The kind tag of a persisted key, if it carries one.
pub fn tag_of(key: &[u8]) -> Option<u8> {
    key.first().copied()
}

/// The field suffix of `key` within the entity `id` under `tag`, if `key`
/// belongs to that entity.
pub fn field_of<'k>(key: &'k [u8], tag: u8, id: &[u8]) -> Option<&'k [u8]> {
    let prefix = entity_prefix(tag, id);
    key.strip_prefix(prefix.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_prefix_layout() {
        let prefix = entity_prefix(TAG_MAP, b"abc");
        assert_eq!(prefix, vec![0x01, 0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn entity_key_appends_field() {
        let key = entity_key(TAG_SET, b"id", b"member");
        assert!(key.starts_with(&entity_prefix(TAG_SET, b"id")));
        assert!(key.ends_with(b"member"));
    }

    #[test]
    fn length_prefix_prevents_id_prefix_collisions() {
        // Without the length prefix, entity "ab" would own entity "abc"'s keys.
        let a = entity_prefix(TAG_MAP, b"ab");
        let b = entity_prefix(TAG_MAP, b"abc");
        assert!(!b.starts_with(a.as_slice()));
    }

    #[test]
    fn field_of_extracts_suffix() {
        let key = entity_key(TAG_MAP, b"m1", b"field");
        assert_eq!(field_of(&key, TAG_MAP, b"m1"), Some(&b"field"[..]));
        assert_eq!(field_of(&key, TAG_SET, b"m1"), None);
        assert_eq!(field_of(&key, TAG_MAP, b"m2"), None);
    }

    #[test]
    fn tag_of_reads_first_byte() {
        assert_eq!(tag_of(&entity_prefix(TAG_COUNTER, b"c")), Some(TAG_COUNTER));
        assert_eq!(tag_of(b""), None);
    }
}
