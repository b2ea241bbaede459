use thiserror::Error;
use weft_kv::KvError;

/// Errors from content store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    /// Underlying key-value store failure.
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// Result alias for content store operations.
pub type ContentResult<T> = Result<T, ContentError>;
