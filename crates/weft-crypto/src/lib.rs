//! Cryptographic primitives for the Weft runtime.
//!
//! Two concerns live here:
//!
//! - **Content hashing** ([`ContentHasher`], [`BlobHasher`]): domain-separated
//!   BLAKE3. Every content-addressed identity in Weft (frozen records, blobs,
//!   delta checksums) goes through a hasher carrying a domain tag, so
//!   identical bytes stored as different kinds can never collide.
//! - **Signatures** ([`SigningKey`], [`VerifyingKey`], [`Signature`]):
//!   ed25519 wrappers. The runtime only ever *verifies* (the `ed25519_verify`
//!   host operation); signing exists for hosts provisioning executor
//!   identities and for tests.

pub mod hasher;
pub mod signer;

pub use hasher::{BlobHasher, ContentHasher};
pub use signer::{verify_detached, Signature, SignatureError, SigningKey, VerifyingKey};
