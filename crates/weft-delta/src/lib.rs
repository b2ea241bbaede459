//! Delta accumulation and atomic commit for Weft state.
//!
//! Every mutation an execution makes — KV writes, CRDT operation effects,
//! content-store inserts — flows through a [`CommitManager`], which applies
//! it to the underlying store immediately (read-your-writes) and appends it
//! to the pending [`Delta`]. At the end of the execution the delta is
//! terminally consumed, either by [`CommitManager::commit`] (persist an
//! artifact keyed by root hash) or [`CommitManager::flush_delta`] (serialize
//! for a peer or relay).
//!
//! The inverse direction, [`CommitManager::apply_storage_delta`], replays a
//! foreign delta's operations in recorded order. Replicated value types
//! reconcile through the [`Merge`] seam instead of clobbering — the CRDT
//! layer supplies the merge rules, this crate only routes values through
//! them.
//!
//! # Wire format
//!
//! A serialized delta is framed for transport:
//!
//! ```text
//! [4 bytes  magic "WFTD"]
//! [4 bytes  version (big-endian u32)]
//! [4 bytes  operation count (big-endian u32)]
//! [4 bytes  CRC32 of payload (little-endian u32)]
//! [N bytes  payload: zstd-compressed bincode of the operation list]
//! [32 bytes BLAKE3 checksum of everything above]
//! ```
//!
//! Decoding verifies magic, version, CRC, and checksum; a delta that fails
//! any of them is rejected before a single operation is applied.

pub mod delta;
pub mod error;
pub mod manager;
pub mod merge;
pub mod op;

pub use delta::Delta;
pub use error::{DeltaError, DeltaResult};
pub use manager::{CommitManager, DeltaPhase, RootState};
pub use merge::{LastWriteMerge, Merge};
pub use op::DeltaOp;
