//! Streaming blob transfer for the Weft runtime.
//!
//! Blobs are large binary objects identified by the BLAKE3 hash of their
//! content, stored separately from the KV ground truth. Content identity is
//! computed incrementally as data is written and finalized at `close` —
//! callers cannot know a blob's id before closing its write handle.
//!
//! Handles are per-open-call resources allocated from a slab; `close` is
//! the only release point. Handle 0 is never issued (the host ABI reserves
//! it as the invalid handle).

pub mod error;
pub mod store;

pub use error::{BlobError, BlobResult};
pub use store::BlobStore;
