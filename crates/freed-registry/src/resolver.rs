//! Registry-backed verification method lookup for dispute proofs.

use freed_dispute::{VerificationMethod, VerificationMethodResolver};
use freed_ledger::LedgerStore;

use crate::registry::IdentityRegistry;

/// Resolves a signer's method from the signer's own DID document.
///
/// The method must be listed in the document whose DID is the signer and
/// must carry key material. With `require_active_controller`, methods of
/// revoked documents are refused.
#[derive(Debug)]
pub struct RegistryMethodResolver<'r, S> {
    registry: &'r IdentityRegistry<S>,
    require_active_controller: bool,
}

impl<'r, S: LedgerStore> RegistryMethodResolver<'r, S> {
    /// Resolver over `registry` that also accepts methods of revoked documents.
    pub fn new(registry: &'r IdentityRegistry<S>) -> Self {
        Self {
            registry,
            require_active_controller: false,
        }
    }

    /// When `require` is set, methods of revoked documents resolve to nothing.
    pub fn require_active_controller(mut self, require: bool) -> Self {
        self.require_active_controller = require;
        self
    }
}

impl<S: LedgerStore> VerificationMethodResolver for RegistryMethodResolver<'_, S> {
    fn resolve(&self, signer: &str, method_id: &str) -> Option<VerificationMethod> {
        let doc = self.registry.resolve(signer)?;
        if self.require_active_controller && doc.revoked {
            tracing::debug!(signer, method_id, "method refused: controller revoked");
            return None;
        }
        doc.method(method_id)?.to_method()
    }
}

impl<S: LedgerStore> IdentityRegistry<S> {
    /// Verification method resolver over this registry.
    pub fn method_resolver(&self) -> RegistryMethodResolver<'_, S> {
        RegistryMethodResolver::new(self)
    }
}
