use freed_core::FreedError;
use freed_ledger::LedgerError;
use thiserror::Error;

/// Errors from registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("DID {0} already exists and is active")]
    AlreadyActive(String),

    #[error("DID {0} does not exist")]
    NotFound(String),

    #[error("DID {0} is revoked")]
    Revoked(String),

    #[error("DID mismatch in update: path={expected} document={found}")]
    DidMismatch { expected: String, found: String },

    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// The audit record could not be written; the operation was not applied.
    #[error("audit ledger error: {0}")]
    Audit(#[from] LedgerError),
}

impl From<RegistryError> for FreedError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Audit(e) => e.into(),
            RegistryError::InvalidDid(_) | RegistryError::DidMismatch { .. } => {
                FreedError::Schema(err.to_string())
            }
            RegistryError::AlreadyActive(_)
            | RegistryError::NotFound(_)
            | RegistryError::Revoked(_)
            | RegistryError::CredentialNotFound(_) => FreedError::Validation(err.to_string()),
        }
    }
}
