use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of every fixed-size Weft identifier, in bytes.
pub const ID_LEN: usize = 32;

macro_rules! define_id {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name([u8; ID_LEN]);

        impl $name {
            /// Wrap a raw 32-byte array.
            pub const fn from_array(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }

            /// Construct from a byte slice, validating the length.
            ///
            /// A slice of any length other than [`ID_LEN`] is a boundary
            /// contract violation, reported as [`TypeError::InvalidLength`].
            pub fn try_from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
                if bytes.len() != ID_LEN {
                    return Err(TypeError::InvalidLength {
                        expected: ID_LEN,
                        actual: bytes.len(),
                    });
                }
                let mut arr = [0u8; ID_LEN];
                arr.copy_from_slice(bytes);
                Ok(Self(arr))
            }

            /// The null identifier (all zeros). Represents "no identity".
            pub const fn null() -> Self {
                Self([0u8; ID_LEN])
            }

            /// Returns `true` if this is the null identifier.
            pub fn is_null(&self) -> bool {
                self.0 == [0u8; ID_LEN]
            }

            /// The raw 32 bytes.
            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                &self.0
            }

            /// Hex-encoded string representation.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Short hex representation (first 8 characters).
            pub fn short_hex(&self) -> String {
                hex::encode(&self.0[..4])
            }

            /// Parse from a hex string.
            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
                Self::try_from_slice(&bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.short_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; ID_LEN]> for $name {
            fn from(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; ID_LEN] {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// The replication scope (context) an execution runs inside.
    ///
    /// Blobs are announced to contexts; every execution carries exactly one.
    ContextId
}

define_id! {
    /// The principal performing operations in an execution.
    ///
    /// Executor identity is the CRDT shard key: counters keep one shard per
    /// executor, and LWW registers break timestamp ties by comparing writer
    /// ids lexicographically.
    ExecutorId
}

define_id! {
    /// A user-storage or frozen-storage instance.
    StorageId
}

define_id! {
    /// Content-addressed identity of a completed blob.
    ///
    /// Computed incrementally while the blob is written and finalized at
    /// close — callers cannot know it earlier.
    BlobId
}

define_id! {
    /// Derived identity of a user-storage record (storage id + user key).
    RecordId
}
