//! Foundation types for the Weft runtime.
//!
//! This crate provides the fixed-size identifier types used throughout the
//! Weft system. Every other Weft crate depends on `weft-types`.
//!
//! # Key Types
//!
//! - [`ContextId`] — The replication scope an execution runs inside
//! - [`ExecutorId`] — The principal performing operations (CRDT shard key)
//! - [`StorageId`] — A user/frozen storage instance
//! - [`BlobId`] — Content-addressed identity of a completed blob
//! - [`RecordId`] — Derived identity of a user-storage record
//!
//! All identifiers are exactly [`ID_LEN`] bytes. Constructing one from a
//! slice of any other length fails with [`TypeError::InvalidLength`] —
//! this is the boundary contract error the host call surface reports
//! distinctly from an ordinary not-found result.

pub mod error;
pub mod id;
pub mod keyspace;

pub use error::TypeError;
pub use id::{BlobId, ContextId, ExecutorId, RecordId, StorageId, ID_LEN};
