use thiserror::Error;
use weft_kv::KvError;

use crate::manager::DeltaPhase;

/// Errors from delta encoding, decoding, and commit management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeltaError {
    /// The serialized delta does not start with the expected magic bytes.
    #[error("bad delta magic")]
    BadMagic,

    /// The serialized delta carries an unsupported format version.
    #[error("unsupported delta version {0}")]
    UnsupportedVersion(u32),

    /// The serialized delta is shorter than its framing requires.
    #[error("truncated delta: {0} bytes")]
    Truncated(usize),

    /// CRC32 of the payload does not match the frame header.
    #[error("delta payload CRC mismatch: expected {expected:08x}, computed {computed:08x}")]
    CrcMismatch { expected: u32, computed: u32 },

    /// Trailing BLAKE3 checksum does not match the frame contents.
    #[error("delta checksum mismatch")]
    ChecksumMismatch,

    /// The decoded operation count disagrees with the frame header.
    #[error("delta operation count mismatch: header {header}, decoded {decoded}")]
    CountMismatch { header: u32, decoded: u32 },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Compression or decompression failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// The delta for this execution has already been terminally consumed.
    #[error("delta already {0:?} for this execution")]
    TerminalPhase(DeltaPhase),

    /// Underlying key-value store failure.
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// Result alias for delta operations.
pub type DeltaResult<T> = Result<T, DeltaError>;
