//! # freed-dispute — Dispute and Recourse Engine
//!
//! A per-case state machine for challenging a credential decision.
//!
//! ## States
//!
//! ```text
//! Opened ──▶ Review ──▶ Resolved ──▶ Reopened ──▶ Review
//!   │          │  ▲         ▲
//!   │          ▼  │         │
//!   │        Escalated ─────┘
//!   │          │
//!   └──▶ Dismissed ◀─(Review)
//!          │
//!          └──▶ Reopened
//! ```
//!
//! Every transition is checked against the edge table first, then against
//! optional authorization layers: a role policy per edge, an authorization
//! proof bound to the actor, replay protection on proof ids, and an
//! HMAC-SHA256 signature over the canonical transition payload verified
//! against a resolved verification method. Checks complete before any state
//! changes, so a rejected transition leaves the case untouched.
//!
//! - **Status** ([`status`]): states and the edge table.
//! - **Role** ([`role`]): actor roles, role inference, per-edge role policy.
//! - **Proof** ([`proof`]): auth proofs, verification methods, HMAC signing.
//! - **Case** ([`case`]): `open_case`, `transition`, events.
//! - **Integrity** ([`integrity`]): `verify_case_history_integrity`.
//! - **Book** ([`book`]): concurrent, per-case-locked case store.

pub mod book;
pub mod case;
pub mod error;
pub mod integrity;
pub mod proof;
pub mod role;
pub mod status;

// Error types
pub use error::{DisputeError, PermissionDenied};

// Case lifecycle
pub use case::{open_case, open_case_at, transition, DisputeCase, DisputeEvent, TransitionOptions};
pub use status::DisputeStatus;

// Authorization
pub use proof::{
    build_hmac_transition_auth_proof, hmac_sign, AuthProof, SecretKey, StaticMethodDirectory,
    TransitionPayload, VerificationMethod, VerificationMethodResolver, HMAC_METHOD_TYPE,
    SIGNATURE_ALGORITHM,
};
pub use role::{allowed_roles, ActorRole, DidSuffixRoleResolver, RoleResolver};

// Verification and storage
pub use book::CaseBook;
pub use integrity::{verify_case_history_integrity, IntegrityReport};
