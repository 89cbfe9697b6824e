//! # Ledger Error Types

use freed_core::{CanonicalizationError, FreedError};
use thiserror::Error;

/// Errors raised by ledger writes and reads.
///
/// Integrity problems found by [`crate::AuditLedger::verify_integrity`] are
/// not errors; they come back as [`crate::IntegrityFailure`].
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The backing store could not be read or written.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized or parsed.
    #[error("ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entry payload could not be canonicalized.
    #[error("ledger canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// `details` must be a JSON object (or null, meaning empty).
    #[error("ledger details must be a JSON object, got {found}")]
    InvalidDetails {
        /// JSON type name that was supplied.
        found: &'static str,
    },

    /// A persisted record does not have the expected shape.
    #[error("ledger record {index} is malformed: {reason}")]
    Schema {
        /// Position of the record in the log.
        index: u64,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<LedgerError> for FreedError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Io(e) => FreedError::Io(e),
            LedgerError::Json(e) => FreedError::Json(e),
            LedgerError::Canonicalization(e) => FreedError::Canonicalization(e),
            LedgerError::InvalidDetails { .. } => FreedError::Validation(err.to_string()),
            LedgerError::Schema { .. } => FreedError::Schema(err.to_string()),
        }
    }
}
