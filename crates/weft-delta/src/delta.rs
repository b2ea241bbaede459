use weft_crypto::ContentHasher;

use crate::error::{DeltaError, DeltaResult};
use crate::op::DeltaOp;

/// Frame magic for serialized deltas.
const MAGIC: &[u8; 4] = b"WFTD";
/// Current wire format version.
const VERSION: u32 = 1;
/// Header size: magic + version + op count + CRC.
const HEADER_SIZE: usize = 16;
/// Trailing checksum size.
const CHECKSUM_SIZE: usize = 32;
/// zstd compression level for delta payloads.
const COMPRESSION_LEVEL: i32 = 3;

/// The ordered log of storage mutations produced by one execution.
///
/// Owned exclusively by the current execution until terminally consumed by
/// commit or flush.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    ops: Vec<DeltaOp>,
}

impl Delta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn push(&mut self, op: DeltaOp) {
        self.ops.push(op);
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if no operations have been recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The recorded operations, in order.
    pub fn ops(&self) -> &[DeltaOp] {
        &self.ops
    }

    /// Drop all recorded operations.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Serialize into the framed wire format.
    pub fn encode(&self) -> DeltaResult<Vec<u8>> {
        let raw = bincode::serialize(&self.ops)
            .map_err(|e| DeltaError::Serialization(e.to_string()))?;
        let payload = zstd::encode_all(raw.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| DeltaError::Compression(e.to_string()))?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
        frame.extend_from_slice(MAGIC);
        frame.extend_from_slice(&VERSION.to_be_bytes());
        frame.extend_from_slice(&(self.ops.len() as u32).to_be_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);

        let checksum = ContentHasher::DELTA.hash(&frame);
        frame.extend_from_slice(&checksum);
        Ok(frame)
    }

    /// Parse a framed wire-format delta, verifying all integrity layers.
    pub fn decode(bytes: &[u8]) -> DeltaResult<Self> {
        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(DeltaError::Truncated(bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(DeltaError::BadMagic);
        }
        let version = u32::from_be_bytes(bytes[4..8].try_into().expect("4 bytes"));
        if version != VERSION {
            return Err(DeltaError::UnsupportedVersion(version));
        }
        let header_count = u32::from_be_bytes(bytes[8..12].try_into().expect("4 bytes"));
        let expected_crc = u32::from_le_bytes(bytes[12..16].try_into().expect("4 bytes"));

        let checksum_at = bytes.len() - CHECKSUM_SIZE;
        let (framed, checksum) = bytes.split_at(checksum_at);
        if !ContentHasher::DELTA.verify(framed, checksum.try_into().expect("32 bytes")) {
            return Err(DeltaError::ChecksumMismatch);
        }

        let payload = &framed[HEADER_SIZE..];
        let computed_crc = crc32fast::hash(payload);
        if computed_crc != expected_crc {
            return Err(DeltaError::CrcMismatch {
                expected: expected_crc,
                computed: computed_crc,
            });
        }

        let raw = zstd::decode_all(payload).map_err(|e| DeltaError::Compression(e.to_string()))?;
        let ops: Vec<DeltaOp> =
            bincode::deserialize(&raw).map_err(|e| DeltaError::Serialization(e.to_string()))?;
        if ops.len() as u32 != header_count {
            return Err(DeltaError::CountMismatch {
                header: header_count,
                decoded: ops.len() as u32,
            });
        }
        Ok(Self { ops })
    }
}

impl FromIterator<DeltaOp> for Delta {
    fn from_iter<I: IntoIterator<Item = DeltaOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
