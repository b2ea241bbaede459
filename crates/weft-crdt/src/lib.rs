//! Replicated data primitives for the Weft runtime.
//!
//! Five conflict-free data types, each persisted through any
//! [`weft_kv::KvStore`] (normally a delta-recording
//! [`weft_delta::CommitManager`]) under a namespaced key prefix:
//!
//! - [`CrdtMap`] — byte-keyed map, overwriting insert, ordered iteration
//! - [`CrdtVector`] — index-addressed sequence with tail push/pop
//! - [`CrdtSet`] — membership set with single-operation `clear`
//! - [`LwwRegister`] — last-writer-wins register with provenance
//! - [`Counter`] — grow-only counter sharded per executor
//!
//! # Determinism
//!
//! Iteration order is the ascending byte order of encoded keys — stable and
//! total, so replicas holding the same state enumerate identically. The
//! merge rules ([`LwwRecord::wins_over`], counter-shard max in
//! [`CrdtMerge`]) are a frozen wire-level contract: replicas replaying the
//! same operations must agree byte-for-byte.
//!
//! Primitives are handles: they borrow a store and an entity id, and hold
//! no state of their own. Operations observe prior committed and in-delta
//! mutations immediately (read-your-writes), because the store they run on
//! is the ground truth.

pub mod counter;
pub mod error;
pub mod lww;
pub mod map;
pub mod merge;
pub mod set;
pub mod vector;

pub use counter::Counter;
pub use error::{CrdtError, CrdtResult};
pub use lww::{LwwRecord, LwwRegister};
pub use map::CrdtMap;
pub use merge::CrdtMerge;
pub use set::CrdtSet;
pub use vector::CrdtVector;
