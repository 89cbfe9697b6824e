//! # Identity Registry
//!
//! In-memory DID document store. Every mutating operation and every
//! presentation build is recorded in the optional [`AuditLedger`].
//!
//! Operations validate, write the audit record, then commit, all under the
//! registry's write lock. A failed audit write leaves the registry unchanged.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use freed_core::Did;
use freed_disclosure::{build_presentation, MinimumDisclosurePolicy, Presentation};
use freed_ledger::{AuditLedger, JsonlFileStore, LedgerConfig, LedgerError, LedgerStore};

use crate::document::{DidDocument, Service, CREDENTIAL_SERVICE_TYPE};
use crate::error::RegistryError;

/// Ledger action names written by the registry.
pub mod actions {
    /// A document was registered.
    pub const REGISTER: &str = "register";
    /// An active document was replaced.
    pub const UPDATE: &str = "update";
    /// A document was revoked.
    pub const REVOKE: &str = "revoke";
    /// A credential service was attached.
    pub const ISSUE_CREDENTIAL: &str = "issue_credential";
    /// A presentation was built from a held credential.
    pub const BUILD_PRESENTATION: &str = "build_presentation";
}

/// DID document registry with optional audit ledger.
#[derive(Debug)]
pub struct IdentityRegistry<S = JsonlFileStore> {
    documents: RwLock<BTreeMap<String, DidDocument>>,
    ledger: Option<AuditLedger<S>>,
}

impl IdentityRegistry<JsonlFileStore> {
    /// Registry without auditing.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            ledger: None,
        }
    }

    /// Registry auditing into the file-backed ledger described by `config`.
    pub fn with_ledger_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self::with_ledger(AuditLedger::open(config)?))
    }
}

impl Default for IdentityRegistry<JsonlFileStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LedgerStore> IdentityRegistry<S> {
    /// Registry auditing into `ledger`.
    pub fn with_ledger(ledger: AuditLedger<S>) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            ledger: Some(ledger),
        }
    }

    /// The audit ledger, when one is attached.
    pub fn ledger(&self) -> Option<&AuditLedger<S>> {
        self.ledger.as_ref()
    }

    fn audit(&self, action: &str, did: &str, details: Value) -> Result<(), RegistryError> {
        if let Some(ledger) = &self.ledger {
            ledger.append(action, did, details)?;
        }
        Ok(())
    }

    /// Register a document, minting `did:freed:<hex>` when its DID is empty.
    ///
    /// A revoked DID may be registered again; an active one may not.
    pub fn register(&self, mut doc: DidDocument) -> Result<String, RegistryError> {
        if doc.did.is_empty() {
            doc.did = generate_did();
        }
        Did::new(doc.did.as_str()).map_err(|_| RegistryError::InvalidDid(doc.did.clone()))?;

        let mut documents = self.documents.write();
        if documents.get(&doc.did).is_some_and(|d| !d.revoked) {
            return Err(RegistryError::AlreadyActive(doc.did));
        }
        self.audit(
            actions::REGISTER,
            &doc.did,
            json!({
                "controller": doc.controller,
                "verification_method_count": doc.verification_methods.len(),
                "service_count": doc.services.len(),
            }),
        )?;
        let did = doc.did.clone();
        tracing::info!(did = %did, methods = doc.verification_methods.len(), "DID registered");
        documents.insert(did.clone(), doc);
        Ok(did)
    }

    /// Snapshot of a document, revoked or not.
    pub fn resolve(&self, did: &str) -> Option<DidDocument> {
        self.documents.read().get(did).cloned()
    }

    /// Replace an active document.
    pub fn update(&self, did: &str, new_doc: DidDocument) -> Result<(), RegistryError> {
        let mut documents = self.documents.write();
        match documents.get(did) {
            None => return Err(RegistryError::NotFound(did.to_string())),
            Some(doc) if doc.revoked => return Err(RegistryError::Revoked(did.to_string())),
            Some(_) => {}
        }
        if new_doc.did != did {
            return Err(RegistryError::DidMismatch {
                expected: did.to_string(),
                found: new_doc.did,
            });
        }
        self.audit(
            actions::UPDATE,
            did,
            json!({
                "verification_method_count": new_doc.verification_methods.len(),
                "service_count": new_doc.services.len(),
            }),
        )?;
        tracing::info!(did, "DID document updated");
        documents.insert(did.to_string(), new_doc);
        Ok(())
    }

    /// Mark a document revoked. Revoking twice is allowed and audited twice.
    pub fn revoke(&self, did: &str) -> Result<(), RegistryError> {
        let mut documents = self.documents.write();
        let doc = documents
            .get_mut(did)
            .ok_or_else(|| RegistryError::NotFound(did.to_string()))?;
        self.audit(actions::REVOKE, did, json!({ "revoked": true }))?;
        tracing::info!(did, "DID revoked");
        doc.revoked = true;
        Ok(())
    }

    /// DIDs of non-revoked documents, sorted.
    pub fn list_active(&self) -> Vec<String> {
        self.documents
            .read()
            .iter()
            .filter(|(_, doc)| !doc.revoked)
            .map(|(did, _)| did.clone())
            .collect()
    }

    /// Attach a credential to an active document. Returns its id,
    /// `{did}#cred-{n}` with `n` the service count before issuing.
    pub fn issue_credential(
        &self,
        did: &str,
        claims: Map<String, Value>,
    ) -> Result<String, RegistryError> {
        let mut documents = self.documents.write();
        let doc = documents
            .get_mut(did)
            .ok_or_else(|| RegistryError::NotFound(did.to_string()))?;
        if doc.revoked {
            return Err(RegistryError::Revoked(did.to_string()));
        }
        let credential_id = format!("{did}#cred-{}", doc.services.len());
        let mut credential_keys: Vec<&String> = claims.keys().collect();
        credential_keys.sort();
        self.audit(
            actions::ISSUE_CREDENTIAL,
            did,
            json!({
                "credential_id": credential_id,
                "credential_keys": credential_keys,
            }),
        )?;
        tracing::info!(did, credential_id = %credential_id, claims = claims.len(), "credential issued");
        doc.services.push(Service {
            id: credential_id.clone(),
            service_type: CREDENTIAL_SERVICE_TYPE.to_string(),
            credential: claims,
        });
        Ok(credential_id)
    }

    /// Whether `did` is active and holds a service with `credential_id`.
    pub fn verify_credential(&self, did: &str, credential_id: &str) -> bool {
        self.documents
            .read()
            .get(did)
            .is_some_and(|doc| !doc.revoked && doc.credential(credential_id).is_some())
    }

    /// Build a minimum-disclosure presentation of a stored credential.
    pub fn build_credential_presentation(
        &self,
        did: &str,
        credential_id: &str,
        requested_fields: &[String],
        policy: &MinimumDisclosurePolicy,
    ) -> Result<Presentation, RegistryError> {
        let claims = {
            let documents = self.documents.read();
            let doc = documents
                .get(did)
                .ok_or_else(|| RegistryError::NotFound(did.to_string()))?;
            doc.credential(credential_id)
                .ok_or_else(|| RegistryError::CredentialNotFound(credential_id.to_string()))?
                .credential
                .clone()
        };
        self.audit(
            actions::BUILD_PRESENTATION,
            did,
            json!({
                "credential_id": credential_id,
                "requested_fields": requested_fields,
            }),
        )?;
        Ok(build_presentation(
            did,
            credential_id,
            &claims,
            requested_fields.iter().map(String::as_str),
            policy,
        ))
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn generate_did() -> String {
    format!("did:freed:{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use freed_ledger::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Ledger store that refuses writes while `down` is set.
    struct FlakyStore {
        inner: MemoryStore,
        down: Arc<AtomicBool>,
    }

    impl LedgerStore for FlakyStore {
        fn read_records(&self) -> Result<Vec<String>, LedgerError> {
            self.inner.read_records()
        }

        fn append_record(&mut self, record: &str) -> Result<(), LedgerError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(LedgerError::Io(std::io::Error::other("disk full")));
            }
            self.inner.append_record(record)
        }

        fn truncate(&mut self) -> Result<(), LedgerError> {
            self.inner.truncate()
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    fn audited() -> IdentityRegistry<MemoryStore> {
        IdentityRegistry::with_ledger(AuditLedger::in_memory())
    }

    fn claims() -> Map<String, Value> {
        json!({"age_over_18": true, "government_id": "X-123", "country": "NZ"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn generates_did() {
        let registry = IdentityRegistry::new();
        let did = registry.register(DidDocument::unassigned("ctrl")).unwrap();
        let hex = did.strip_prefix("did:freed:").unwrap();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(registry.resolve(&did).unwrap().did, did);
    }

    #[test]
    fn rejects_malformed_did() {
        let registry = IdentityRegistry::new();
        let err = registry.register(DidDocument::new("not-a-did", "c")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDid(_)));
    }

    #[test]
    fn lifecycle_is_audited_and_chained() {
        let registry = audited();
        let did = registry.register(DidDocument::new("did:freed:alice", "did:freed:alice")).unwrap();
        let cred = registry.issue_credential(&did, claims()).unwrap();
        assert_eq!(cred, "did:freed:alice#cred-0");
        registry.revoke(&did).unwrap();

        let ledger = registry.ledger().unwrap();
        assert_eq!(ledger.verify_integrity().unwrap(), 3);
        let entries = ledger.entries().unwrap();
        let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["register", "issue_credential", "revoke"]);
        assert_eq!(
            entries[1].details["credential_keys"],
            json!(["age_over_18", "country", "government_id"])
        );
        assert_eq!(entries[0].details["verification_method_count"], 0);
    }

    #[test]
    fn active_did_cannot_be_reregistered_until_revoked() {
        let registry = IdentityRegistry::new();
        registry.register(DidDocument::new("did:freed:bob", "c")).unwrap();
        assert!(matches!(
            registry.register(DidDocument::new("did:freed:bob", "c")),
            Err(RegistryError::AlreadyActive(_))
        ));
        registry.revoke("did:freed:bob").unwrap();
        assert!(registry.list_active().is_empty());
        registry.register(DidDocument::new("did:freed:bob", "c2")).unwrap();
        assert_eq!(registry.list_active(), vec!["did:freed:bob"]);
    }

    #[test]
    fn update_rules() {
        let registry = audited();
        registry.register(DidDocument::new("did:freed:carol", "c")).unwrap();
        let err = registry
            .update("did:freed:carol", DidDocument::new("did:freed:dave", "c"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DidMismatch { .. }));
        assert!(matches!(
            registry.update("did:freed:nobody", DidDocument::new("did:freed:nobody", "c")),
            Err(RegistryError::NotFound(_))
        ));
        registry
            .update("did:freed:carol", DidDocument::new("did:freed:carol", "c2"))
            .unwrap();
        assert_eq!(registry.resolve("did:freed:carol").unwrap().controller, "c2");
        registry.revoke("did:freed:carol").unwrap();
        assert!(matches!(
            registry.update("did:freed:carol", DidDocument::new("did:freed:carol", "c3")),
            Err(RegistryError::Revoked(_))
        ));
        // register, update, revoke; rejected calls are not audited
        assert_eq!(registry.ledger().unwrap().len().unwrap(), 3);
    }

    #[test]
    fn credentials_on_revoked_documents() {
        let registry = IdentityRegistry::new();
        let did = registry.register(DidDocument::new("did:freed:erin", "c")).unwrap();
        let cred = registry.issue_credential(&did, claims()).unwrap();
        assert!(registry.verify_credential(&did, &cred));
        assert!(!registry.verify_credential(&did, "did:freed:erin#cred-9"));
        registry.revoke(&did).unwrap();
        assert!(!registry.verify_credential(&did, &cred));
        assert!(matches!(
            registry.issue_credential(&did, Map::new()),
            Err(RegistryError::Revoked(_))
        ));
    }

    #[test]
    fn presentation_is_filtered_and_audited() {
        let registry = audited();
        let did = registry.register(DidDocument::new("did:freed:frank", "c")).unwrap();
        let cred = registry.issue_credential(&did, claims()).unwrap();
        let requested = vec!["age_over_18".to_string(), "government_id".to_string()];
        let presentation = registry
            .build_credential_presentation(&did, &cred, &requested, &MinimumDisclosurePolicy::default())
            .unwrap();
        assert_eq!(presentation.disclosed_claims, *json!({"age_over_18": true}).as_object().unwrap());
        assert!(presentation.denied_sensitive_fields.contains("government_id"));
        assert!(presentation.redacted_fields.contains("country"));

        let entries = registry.ledger().unwrap().entries().unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last.action, "build_presentation");
        assert_eq!(last.details["requested_fields"], json!(["age_over_18", "government_id"]));

        assert!(matches!(
            registry.build_credential_presentation(&did, "nope", &requested, &MinimumDisclosurePolicy::default()),
            Err(RegistryError::CredentialNotFound(_))
        ));
    }

    #[test]
    fn failed_audit_leaves_documents_untouched() {
        let down = Arc::new(AtomicBool::new(false));
        let registry = IdentityRegistry::with_ledger(AuditLedger::new(FlakyStore {
            inner: MemoryStore::new(),
            down: Arc::clone(&down),
        }));
        let did = registry.register(DidDocument::new("did:freed:hana", "did:freed:hana")).unwrap();
        registry.issue_credential(&did, claims()).unwrap();
        let before = registry.resolve(&did).unwrap();

        down.store(true, Ordering::SeqCst);
        let err = registry
            .register(DidDocument::new("did:freed:ivan", "did:freed:ivan"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Audit(LedgerError::Io(_))));
        assert!(registry.resolve("did:freed:ivan").is_none());

        assert!(matches!(registry.revoke(&did), Err(RegistryError::Audit(_))));
        assert!(matches!(
            registry.issue_credential(&did, claims()),
            Err(RegistryError::Audit(_))
        ));
        let after = registry.resolve(&did).unwrap();
        assert!(!after.revoked);
        assert_eq!(after.services, before.services);
        assert_eq!(registry.list_active(), vec![did.clone()]);

        let ledger = registry.ledger().unwrap();
        assert_eq!(ledger.len().unwrap(), 2);
        down.store(false, Ordering::SeqCst);
        assert_eq!(registry.issue_credential(&did, claims()).unwrap(), "did:freed:hana#cred-1");
        assert_eq!(ledger.verify_integrity().unwrap(), 3);
    }

    #[test]
    fn file_backed_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::at(dir.path().join("audit.jsonl"));
        let registry = IdentityRegistry::with_ledger_config(&config).unwrap();
        registry.register(DidDocument::new("did:freed:gina", "c")).unwrap();
        drop(registry);
        let reopened = AuditLedger::open(&config).unwrap();
        assert_eq!(reopened.verify_integrity().unwrap(), 1);
    }
}
