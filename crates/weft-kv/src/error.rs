use thiserror::Error;

/// Errors from key-value store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KvError {
    /// The key exceeds the implementation-defined length bound.
    #[error("key too long: {actual} bytes (max {max})")]
    KeyTooLong { max: usize, actual: usize },

    /// A mutation arrived after the execution's delta reached a terminal
    /// phase (committed or flushed). Recording wrappers reject it; the
    /// base stores never produce this.
    #[error("storage is finalized for this execution")]
    Finalized,
}

/// Result alias for key-value operations.
pub type KvResult<T> = Result<T, KvError>;
