use thiserror::Error;

/// Errors from blob transfer operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobError {
    /// The handle does not name an open blob.
    #[error("unknown blob handle {0}")]
    UnknownHandle(u64),

    /// A read was attempted on a handle opened for writing.
    #[error("handle {0} is open for writing, not reading")]
    NotReadable(u64),

    /// A write was attempted on a handle opened for reading.
    #[error("handle {0} is open for reading, not writing")]
    NotWritable(u64),
}

/// Result alias for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;
