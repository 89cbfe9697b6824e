//! # freed-ledger — Hash-Chained Audit Ledger
//!
//! An append-only log of governance actions (`register`, `update`, `revoke`,
//! `issue_credential`, `build_presentation`, ...). Each entry commits to its
//! predecessor:
//!
//! ```text
//! entry_hash = SHA256(prev_hash ++ canonical({action, details, did, index, timestamp_utc}))
//! ```
//!
//! with `prev_hash` of entry 0 equal to 64 zeros. Editing any persisted byte
//! of an entry breaks that entry's hash, and rewriting the hash breaks the
//! next entry's `prev_hash` link.
//!
//! - **Entry** ([`entry`]): the record type and the hash function.
//! - **Store** ([`store`]): `LedgerStore` trait with a file-locked JSON Lines
//!   store and an in-memory store.
//! - **Ledger** ([`ledger`]): serialized `append`, `verify_integrity`,
//!   typed read-back, explicit `reset`.
//! - **Config** ([`config`]): environment-driven ledger configuration.

pub mod config;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod store;

pub use config::{ConfigError, LedgerConfig};
pub use entry::{compute_entry_hash, AppendReceipt, LedgerEntry};
pub use error::LedgerError;
pub use ledger::{AuditLedger, IntegrityFailure, IntegrityFailureKind};
pub use store::{JsonlFileStore, LedgerStore, MemoryStore};
