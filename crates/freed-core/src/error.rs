//! # Error Types — Governance Error Taxonomy
//!
//! Every failure the governance core can report falls in one of four
//! categories: a request the state machine does not permit (validation), a
//! request the caller is not authorized to make (permission), a detected
//! tamper (integrity), or a persisted record that does not have the expected
//! shape (schema). Subsystem crates keep their own precise `thiserror` enums
//! and convert into [`FreedError`] at the boundary.
//!
//! Errors never carry secret key material.

use thiserror::Error;

/// Coarse category of a governance failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The requested operation is not permitted by the state machine.
    Validation,
    /// The caller lacks a valid authorization for the operation.
    Permission,
    /// A hash chain or event history failed verification.
    Integrity,
    /// A persisted record is missing fields or malformed.
    Schema,
    /// Serialization, canonicalization or I/O failure.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Permission => "permission",
            Self::Integrity => "integrity",
            Self::Schema => "schema",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Top-level error type for the governance stack.
#[derive(Error, Debug)]
pub enum FreedError {
    /// The operation is not allowed from the current state.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing, invalid, or replayed authorization.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Tamper detected by a verifier.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Persisted record missing required fields or malformed.
    #[error("schema error: {0}")]
    Schema(String),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FreedError {
    /// The taxonomy category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Permission(_) => ErrorCategory::Permission,
            Self::Integrity(_) => ErrorCategory::Integrity,
            Self::Schema(_) => ErrorCategory::Schema,
            Self::Canonicalization(_) | Self::Json(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_variants() {
        assert_eq!(
            FreedError::Validation("opened -> resolved".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            FreedError::Permission("replayed proof".into()).category(),
            ErrorCategory::Permission
        );
        assert_eq!(
            FreedError::Integrity("entry_hash_mismatch".into()).category(),
            ErrorCategory::Integrity
        );
        assert_eq!(
            FreedError::Schema("missing prev_hash".into()).category(),
            ErrorCategory::Schema
        );
        assert_eq!(
            FreedError::from(CanonicalizationError::from(
                serde_json::from_str::<serde_json::Value>("{").unwrap_err()
            ))
            .category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn display_carries_context() {
        let err = FreedError::Permission("signer mismatch: did:freed:council-1".into());
        let msg = err.to_string();
        assert!(msg.starts_with("permission denied"));
        assert!(msg.contains("did:freed:council-1"));
    }

    #[test]
    fn non_string_map_keys_fail_canonicalization() {
        let map = std::collections::BTreeMap::from([((1u8, 2u8), "tuple key")]);
        let err = crate::CanonicalBytes::new(&map).unwrap_err();
        assert!(err.to_string().starts_with("serialization failed"));
    }

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::Permission.to_string(), "permission");
        assert_eq!(ErrorCategory::Schema.to_string(), "schema");
    }
}
