//! User-scoped and frozen content storage for the Weft runtime.
//!
//! Both stores are instances identified by a 32-byte [`StorageId`] and
//! persist through the same delta-recording KV store as everything else:
//!
//! - [`UserStore`] keeps one record per (instance, user key). The API keeps
//!   "my value" and "another principal's value" as separate operations so a
//!   higher layer can gate cross-user reads independently.
//! - [`FrozenStore`] keeps immutable records addressed by a 32-byte content
//!   hash. The hash is supplied by the caller side of the boundary; this
//!   engine only indexes by it. Adding the same content twice is a no-op.

pub mod error;
pub mod frozen;
pub mod user;

pub use error::{ContentError, ContentResult};
pub use frozen::FrozenStore;
pub use user::UserStore;
