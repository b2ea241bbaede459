use thiserror::Error;
use weft_kv::KvError;

/// Errors from CRDT primitive operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrdtError {
    /// A stored record could not be decoded.
    #[error("corrupt record for entity {entity}: {reason}")]
    CorruptRecord { entity: String, reason: String },

    /// Underlying key-value store failure.
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// Result alias for CRDT operations.
pub type CrdtResult<T> = Result<T, CrdtError>;
