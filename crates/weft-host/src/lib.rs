//! The Weft host runtime.
//!
//! A [`Runtime`] is the host side of one contract execution: it owns the
//! execution's identity (context, executor, input), a delta-recording store
//! wired through every storage engine, the register bank, a monotonic
//! clock, the blob store, and the event outbox.
//!
//! The engines themselves return values directly; register indirection
//! survives only at the [`HostCall`] dispatch layer, for the operations
//! whose ABI signature carries a register id. `HostCall` values are
//! validated at construction — a wrong-length fixed-size id never becomes
//! a call.
//!
//! # Execution lifecycle
//!
//! One execution runs to completion or failure before another observes
//! host state. On success the guest ends the execution with `commit` or
//! `flush_delta`; on fatal failure the embedder calls
//! [`Runtime::abort`], which discards the pending delta and clears the
//! register bank, leaving previously committed root state untouched.

pub mod call;
pub mod clock;
pub mod error;
pub mod event;
pub mod registers;
pub mod runtime;

pub use call::{HostCall, HostResponse};
pub use clock::MonotonicClock;
pub use error::{HostError, HostResult};
pub use event::Event;
pub use registers::RegisterBank;
pub use runtime::Runtime;
