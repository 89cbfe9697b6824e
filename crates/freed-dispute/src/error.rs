//! # Dispute Error Types
//!
//! `DisputeError` separates state-machine violations (validation) from
//! authorization failures ([`PermissionDenied`]). Messages name proof ids,
//! method ids and DIDs but never key material.

use freed_core::{CanonicalizationError, FreedError, Timestamp};
use thiserror::Error;

use crate::role::ActorRole;
use crate::status::DisputeStatus;

/// Errors from the dispute engine.
#[derive(Error, Debug)]
pub enum DisputeError {
    /// The edge is not in the transition table.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: DisputeStatus,
        to: DisputeStatus,
    },

    /// An explicit event time precedes the last recorded event.
    #[error("event timestamp {at} precedes last event at {last}")]
    TimestampRegression { at: Timestamp, last: Timestamp },

    /// History reached the maximum sequence number.
    #[error("case {0} history is full")]
    HistoryFull(String),

    /// Authorization failed.
    #[error(transparent)]
    Permission(#[from] PermissionDenied),

    /// Transition payload could not be canonicalized.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Secret key material could not be decoded.
    #[error("invalid secret key for method {method_id}")]
    InvalidSecretKey { method_id: String },

    #[error("unknown dispute case: {0}")]
    UnknownCase(String),

    #[error("dispute case already exists: {0}")]
    DuplicateCase(String),
}

impl DisputeError {
    /// Whether this is an authorization failure.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_))
    }
}

/// Why a transition was not authorized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionDenied {
    #[error("auth proof required for {from} -> {to}")]
    MissingProof {
        from: DisputeStatus,
        to: DisputeStatus,
    },

    #[error("auth proof missing required fields: {}", .0.join(","))]
    IncompleteProof(Vec<&'static str>),

    #[error("auth proof signer mismatch: signer={signer} actor={actor}")]
    SignerMismatch { signer: String, actor: String },

    #[error("unauthorized transition actor role: role={role} transition={from}->{to}")]
    UnauthorizedRole {
        role: ActorRole,
        from: DisputeStatus,
        to: DisputeStatus,
    },

    #[error("replayed auth proof: {0}")]
    ReplayedProof(String),

    #[error("signature verification requires a verification method resolver")]
    NoResolver,

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("auth proof missing payload digest")]
    MissingPayloadDigest,

    #[error("payload digest mismatch: expected={expected} found={found}")]
    PayloadDigestMismatch { expected: String, found: String },

    #[error("auth proof missing verification method id")]
    MissingMethodId,

    #[error("unknown verification method: {0}")]
    UnknownMethod(String),

    #[error("verification method {method_id} {field} mismatch")]
    MethodMismatch {
        method_id: String,
        field: &'static str,
    },

    #[error("auth proof missing signature")]
    MissingSignature,

    #[error("signature mismatch for proof {0}")]
    SignatureMismatch(String),
}

impl From<DisputeError> for FreedError {
    fn from(err: DisputeError) -> Self {
        match err {
            DisputeError::Permission(denied) => FreedError::Permission(denied.to_string()),
            DisputeError::Canonicalization(e) => FreedError::Canonicalization(e),
            DisputeError::InvalidSecretKey { .. } => FreedError::Schema(err.to_string()),
            DisputeError::InvalidTransition { .. }
            | DisputeError::TimestampRegression { .. }
            | DisputeError::HistoryFull(_)
            | DisputeError::UnknownCase(_)
            | DisputeError::DuplicateCase(_) => FreedError::Validation(err.to_string()),
        }
    }
}
