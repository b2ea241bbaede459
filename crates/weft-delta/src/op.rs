use serde::{Deserialize, Serialize};

/// A single storage mutation recorded in a delta.
///
/// Operations are replayed in recorded order by
/// [`crate::CommitManager::apply_storage_delta`]. `Truncate` exists so that
/// clearing a whole entity (e.g. CRDT set `clear`) costs one delta entry
/// instead of one per element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaOp {
    /// Write `value` at `key`.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove the entry at `key`.
    Delete { key: Vec<u8> },
    /// Remove every entry whose key starts with `prefix`.
    Truncate { prefix: Vec<u8> },
}

impl DeltaOp {
    /// The key (or prefix) this operation touches.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
            Self::Truncate { prefix } => prefix,
        }
    }
}
