use thiserror::Error;
use weft_types::TypeError;

/// Errors surfaced by the host runtime.
///
/// Not-found conditions are *not* errors — they are `Option`/`bool`
/// results the caller branches on. This enum carries the other two legs of
/// the taxonomy: boundary contract violations (malformed fixed-size
/// arguments), and typed failures from the engines underneath. Truly
/// unrecoverable conditions are not representable here; the embedder
/// handles those by aborting the execution ([`crate::Runtime::abort`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// A fixed-size argument had the wrong length at the call boundary.
    ///
    /// Reported distinctly from not-found: the call never reached an
    /// engine.
    #[error("boundary violation for {argument}: {source}")]
    Boundary {
        argument: &'static str,
        source: TypeError,
    },

    /// Key-value store failure.
    #[error(transparent)]
    Kv(#[from] weft_kv::KvError),

    /// CRDT engine failure.
    #[error(transparent)]
    Crdt(#[from] weft_crdt::CrdtError),

    /// Content store failure.
    #[error(transparent)]
    Content(#[from] weft_content::ContentError),

    /// Delta manager failure.
    #[error(transparent)]
    Delta(#[from] weft_delta::DeltaError),

    /// Blob transfer failure.
    #[error(transparent)]
    Blob(#[from] weft_blob::BlobError),
}

impl HostError {
    /// Build a boundary violation for the named argument.
    pub fn boundary(argument: &'static str, source: TypeError) -> Self {
        Self::Boundary { argument, source }
    }

    /// Returns `true` if this is a call-boundary contract violation.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Boundary { .. })
    }
}

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;
