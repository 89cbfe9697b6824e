#![deny(missing_docs)]
//! # freed-core — Foundational Types for the Freed ID Governance Stack
//!
//! Every other crate in the workspace depends on `freed-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All hash-chain and signature inputs flow
//!    through `CanonicalBytes::new()`: sorted keys, compact separators,
//!    ASCII-escaped text. No raw `serde_json::to_vec()` for digests, so the
//!    audit ledger and the dispute proof payloads hash the same bytes in every
//!    implementation, including ledgers written before this crate existed.
//!
//! 2. **UTC-only timestamps.** `Timestamp` is UTC, second precision, `Z`
//!    suffix, matching the persisted `timestamp_utc` / `at_utc` fields.
//!
//! 3. **One error taxonomy.** [`FreedError`] carries the four governance
//!    categories (validation, permission, integrity, schema). Subsystem crates
//!    define their own `thiserror` enums and convert into it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `freed-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{
    bytes_to_hex, hex_to_bytes, is_sha256_hex, sha256_digest, sha256_hex, ContentDigest,
    DigestAlgorithm, Sha256Accumulator, ZERO_HASH,
};
pub use error::{CanonicalizationError, ErrorCategory, FreedError};
pub use identity::Did;
pub use temporal::Timestamp;
