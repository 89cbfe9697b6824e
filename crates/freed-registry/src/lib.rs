//! # freed-registry — Identity Registry
//!
//! Minimal in-memory store of Freed ID DID documents. It is the collaborator
//! that drives the governance core from the outside:
//!
//! - `register`, `update`, `revoke`, `issue_credential` and
//!   `build_credential_presentation` each append one record to the audit
//!   ledger, when one is attached;
//! - presentations are built by the minimum-disclosure engine;
//! - [`RegistryMethodResolver`] serves DID document verification methods to
//!   the dispute engine.
//!
//! The core crates never call back into the registry.

pub mod document;
pub mod error;
pub mod registry;
pub mod resolver;

pub use document::{
    DidDocument, Service, VerificationMethodRecord, CREDENTIAL_SERVICE_TYPE, DID_CONTEXT,
};
pub use error::RegistryError;
pub use registry::{actions, IdentityRegistry};
pub use resolver::RegistryMethodResolver;
