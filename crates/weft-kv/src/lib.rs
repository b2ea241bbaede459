//! Byte-string key-value storage for the Weft runtime.
//!
//! This is the ground truth every higher structure (CRDT primitives, user
//! and frozen content, root state) persists through. Keys are structured by
//! the layers above (kind tag + entity id + field) but fully opaque here.
//!
//! # Contract
//!
//! - Writes and removes are immediately visible to subsequent operations in
//!   the same execution — there is no staleness at this layer.
//! - [`KvStore::scan_prefix`] enumerates entries in ascending byte order of
//!   the full key. That order is the stable, total iteration order the CRDT
//!   layer relies on for deterministic iteration across replicas.
//! - Keys longer than [`MAX_KEY_LEN`] are rejected at write time. This
//!   layer performs no I/O retries; it either succeeds or the error is
//!   programmer-visible.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{KvError, KvResult};
pub use memory::MemoryKvStore;
pub use traits::KvStore;

/// Implementation-defined upper bound on key length, in bytes.
pub const MAX_KEY_LEN: usize = 2048;
