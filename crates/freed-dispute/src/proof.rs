//! # Transition Authorization Proofs
//!
//! A proof binds one signer to one transition of one case:
//!
//! ```text
//! payload_sha256 = SHA256(canonical({actor, case_id, credential_id, event_seq,
//!                                    from_status, note, subject_did, to_status}))
//! signature_hex  = HMAC-SHA256(method secret, payload_sha256 as ASCII hex)
//! ```
//!
//! `event_seq` is the index the new event will take, so a proof signed for
//! one step cannot be replayed at another even with a fresh `proof_id`.
//!
//! ## Security Invariant
//!
//! Secret key material lives only in [`SecretKey`]: zeroized on drop,
//! redacted in `Debug`, never serialized. Signature comparison is constant
//! time.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use freed_core::{
    bytes_to_hex, hex_to_bytes, sha256_hex, CanonicalBytes, CanonicalizationError, Timestamp,
};

use crate::case::DisputeCase;
use crate::error::{DisputeError, PermissionDenied};
use crate::status::DisputeStatus;

/// The only verification method type this engine verifies.
pub const HMAC_METHOD_TYPE: &str = "HmacSha256VerificationKey2026";

/// Algorithm tag carried by proofs this engine produces.
pub const SIGNATURE_ALGORITHM: &str = "hmac-sha256-v1";

type HmacSha256 = Hmac<Sha256>;

// ── Secret keys ─────────────────────────────────────────────────────────

/// Shared secret of an HMAC verification method.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode a hex-encoded secret. The error never echoes the input.
    pub fn from_hex(hex: &str, method_id: &str) -> Result<Self, DisputeError> {
        hex_to_bytes(hex.trim())
            .map(Self)
            .map_err(|_| DisputeError::InvalidSecretKey {
                method_id: method_id.to_string(),
            })
    }

    /// Raw secret bytes, for MAC computation only.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

// ── Verification methods ────────────────────────────────────────────────

/// A verification method resolved from a DID document or directory.
#[derive(Debug, Clone)]
pub struct VerificationMethod {
    /// Method id, e.g. `did:freed:reviewer-1#hmac-1`.
    pub id: String,
    /// DID that controls the method.
    pub controller: String,
    /// Method type, e.g. `HmacSha256VerificationKey2026`.
    pub method_type: String,
    /// Shared HMAC secret. Never logged or serialized.
    pub secret: SecretKey,
}

impl VerificationMethod {
    /// An `HmacSha256VerificationKey2026` method.
    pub fn hmac(id: impl Into<String>, controller: impl Into<String>, secret: SecretKey) -> Self {
        Self {
            id: id.into(),
            controller: controller.into(),
            method_type: HMAC_METHOD_TYPE.to_string(),
            secret,
        }
    }
}

/// Looks up the verification method a signer claims to have used.
pub trait VerificationMethodResolver: Send + Sync {
    /// Method `method_id` as claimed by `signer`, if known.
    fn resolve(&self, signer: &str, method_id: &str) -> Option<VerificationMethod>;
}

impl<F> VerificationMethodResolver for F
where
    F: Fn(&str, &str) -> Option<VerificationMethod> + Send + Sync,
{
    fn resolve(&self, signer: &str, method_id: &str) -> Option<VerificationMethod> {
        self(signer, method_id)
    }
}

/// Fixed set of methods keyed by method id.
#[derive(Debug, Clone, Default)]
pub struct StaticMethodDirectory {
    methods: HashMap<String, VerificationMethod>,
}

impl StaticMethodDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a method, keyed by its id.
    pub fn insert(&mut self, method: VerificationMethod) {
        self.methods.insert(method.id.clone(), method);
    }

    /// Builder form of [`StaticMethodDirectory::insert`].
    pub fn with(mut self, method: VerificationMethod) -> Self {
        self.insert(method);
        self
    }

    /// Method registered under `method_id`.
    pub fn get(&self, method_id: &str) -> Option<&VerificationMethod> {
        self.methods.get(method_id)
    }
}

impl VerificationMethodResolver for StaticMethodDirectory {
    fn resolve(&self, _signer: &str, method_id: &str) -> Option<VerificationMethod> {
        self.methods.get(method_id).cloned()
    }
}

// ── Proofs ──────────────────────────────────────────────────────────────

/// Authorization proof presented with a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProof {
    /// Unique id; a case accepts each id once.
    pub proof_id: String,
    #[serde(rename = "signer_did")]
    pub signer: String,
    /// Opaque reference to the signing context.
    pub signature_ref: String,
    #[serde(rename = "issued_utc")]
    pub issued_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_method_id: Option<String>,
    #[serde(rename = "payload_sha256", default, skip_serializing_if = "Option::is_none")]
    pub payload_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
}

impl AuthProof {
    /// An unsigned proof, for deployments that only bind actors to proofs.
    pub fn unsigned(
        proof_id: impl Into<String>,
        signer: impl Into<String>,
        signature_ref: impl Into<String>,
        issued_at: Timestamp,
    ) -> Self {
        Self {
            proof_id: proof_id.into(),
            signer: signer.into(),
            signature_ref: signature_ref.into(),
            issued_at: issued_at.to_iso8601(),
            verification_method_id: None,
            payload_digest: None,
            signature_hex: None,
            signature_algorithm: None,
        }
    }

    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("proof_id", &self.proof_id),
            ("signer_did", &self.signer),
            ("signature_ref", &self.signature_ref),
            ("issued_utc", &self.issued_at),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

/// The canonical payload a transition proof signs.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionPayload<'a> {
    pub actor: &'a str,
    pub case_id: &'a str,
    pub credential_id: &'a str,
    pub event_seq: u32,
    pub from_status: DisputeStatus,
    pub note: &'a str,
    #[serde(rename = "subject_did")]
    pub subject_id: &'a str,
    pub to_status: DisputeStatus,
}

impl<'a> TransitionPayload<'a> {
    /// Payload for the next transition of `case`.
    pub fn for_next(
        case: &'a DisputeCase,
        actor: &'a str,
        to_status: DisputeStatus,
        note: &'a str,
    ) -> Result<Self, DisputeError> {
        let event_seq = u32::try_from(case.history.len())
            .map_err(|_| DisputeError::HistoryFull(case.case_id.clone()))?;
        Ok(Self {
            actor,
            case_id: &case.case_id,
            credential_id: &case.credential_id,
            event_seq,
            from_status: case.status,
            note,
            subject_id: &case.subject_id,
            to_status,
        })
    }

    /// SHA-256 of the canonical payload, lowercase hex.
    pub fn digest_hex(&self) -> Result<String, CanonicalizationError> {
        Ok(sha256_hex(&CanonicalBytes::new(self)?))
    }
}

/// `HMAC-SHA256(secret, message)` as lowercase hex.
pub fn hmac_sign(secret: &SecretKey, message: &[u8]) -> String {
    bytes_to_hex(&hmac_bytes(secret, message))
}

fn hmac_bytes(secret: &SecretKey, message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

/// Build a signed proof for the next transition of `case`.
#[allow(clippy::too_many_arguments)]
pub fn build_hmac_transition_auth_proof(
    case: &DisputeCase,
    proof_id: &str,
    signer: &str,
    actor: &str,
    to_status: DisputeStatus,
    note: &str,
    method: &VerificationMethod,
) -> Result<AuthProof, DisputeError> {
    let digest = TransitionPayload::for_next(case, actor, to_status, note)?.digest_hex()?;
    let signature = hmac_sign(&method.secret, digest.as_bytes());
    Ok(AuthProof {
        proof_id: proof_id.to_string(),
        signer: signer.to_string(),
        signature_ref: format!("{}#{}", method.id, proof_id),
        issued_at: Timestamp::now().to_iso8601(),
        verification_method_id: Some(method.id.clone()),
        payload_digest: Some(digest),
        signature_hex: Some(signature),
        signature_algorithm: Some(SIGNATURE_ALGORITHM.to_string()),
    })
}

/// Verify `proof` against the expected payload digest.
///
/// Returns the resolved method id on success.
pub(crate) fn verify_proof_signature(
    proof: &AuthProof,
    expected_digest: &str,
    resolver: Option<&dyn VerificationMethodResolver>,
) -> Result<String, PermissionDenied> {
    let resolver = resolver.ok_or(PermissionDenied::NoResolver)?;

    if let Some(alg) = proof.signature_algorithm.as_deref() {
        if alg != SIGNATURE_ALGORITHM {
            return Err(PermissionDenied::UnsupportedAlgorithm(alg.to_string()));
        }
    }

    let supplied_digest = non_empty(&proof.payload_digest).ok_or(PermissionDenied::MissingPayloadDigest)?;
    if supplied_digest != expected_digest {
        return Err(PermissionDenied::PayloadDigestMismatch {
            expected: expected_digest.to_string(),
            found: supplied_digest.to_string(),
        });
    }

    let method_id = non_empty(&proof.verification_method_id).ok_or(PermissionDenied::MissingMethodId)?;
    let method = resolver
        .resolve(&proof.signer, method_id)
        .ok_or_else(|| PermissionDenied::UnknownMethod(method_id.to_string()))?;
    let mismatch = |field| PermissionDenied::MethodMismatch {
        method_id: method_id.to_string(),
        field,
    };
    if method.id != method_id {
        return Err(mismatch("id"));
    }
    if method.controller != proof.signer {
        return Err(mismatch("controller"));
    }
    if method.method_type != HMAC_METHOD_TYPE {
        return Err(mismatch("type"));
    }

    let signature_hex = non_empty(&proof.signature_hex).ok_or(PermissionDenied::MissingSignature)?;
    let supplied = hex_to_bytes(signature_hex)
        .map_err(|_| PermissionDenied::SignatureMismatch(proof.proof_id.clone()))?;
    let expected = hmac_bytes(&method.secret, expected_digest.as_bytes());
    if expected.is_empty() || !bool::from(expected.ct_eq(&supplied)) {
        return Err(PermissionDenied::SignatureMismatch(proof.proof_id.clone()));
    }
    Ok(method.id)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
