//! # Dispute Cases
//!
//! A case is created by [`open_case`] with a synthetic genesis event
//! (`none -> opened`, seq 0) and changes only through [`transition`].
//!
//! ## Transition checks
//!
//! In order, all before any mutation:
//!
//! 1. the edge is in the transition table (validation error otherwise,
//!    before any proof or role check)
//! 2. actor role resolved (explicit override or [`RoleResolver`])
//! 3. proof shape; signer bound to actor when `enforce_signer_match`;
//!    proof present when `require_auth_proof`
//! 4. role allowed for the edge when `enforce_actor_policy`
//! 5. proof id not already used when `reject_replayed_proof`
//! 6. signature over the canonical transition payload, when
//!    `require_signature_verification` or whenever a proof and a resolver
//!    are both supplied
//! 7. event timestamp not before the last event
//!
//! Then the event is appended, the proof id recorded, and the status moved.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use freed_core::Timestamp;

use crate::error::{DisputeError, PermissionDenied};
use crate::integrity::{verify_case_history_integrity, IntegrityReport};
use crate::proof::{verify_proof_signature, AuthProof, TransitionPayload, VerificationMethodResolver};
use crate::role::{allowed_roles, ActorRole, DidSuffixRoleResolver, RoleResolver};
use crate::status::{self, DisputeStatus};

/// Note recorded on every genesis event.
pub const GENESIS_NOTE: &str = "case opened";

// ── Events ──────────────────────────────────────────────────────────────

/// One entry of a case's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeEvent {
    /// `{case_id}:event:{seq:04}`.
    pub event_id: String,
    #[serde(rename = "event_seq")]
    pub seq: u32,
    #[serde(rename = "at_utc")]
    pub timestamp: Timestamp,
    /// DID that performed the transition.
    pub actor: String,
    /// Role the actor acted in.
    pub actor_role: ActorRole,
    /// `None` only for the genesis event.
    #[serde(with = "status::from_status")]
    pub from_status: Option<DisputeStatus>,
    /// Status after the event.
    pub to_status: DisputeStatus,
    /// Free-text note, covered by the payload digest.
    pub note: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    #[serde(default)]
    pub auth_proof_id: Option<String>,
    #[serde(rename = "signer_did", default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub verification_method_id: Option<String>,
    #[serde(rename = "payload_sha256", default)]
    pub payload_digest: Option<String>,
    #[serde(default)]
    pub signature_verified: bool,
}

/// Event id for position `seq` of case `case_id`.
pub fn event_id(case_id: &str, seq: u32) -> String {
    format!("{case_id}:event:{seq:04}")
}

// ── Cases ───────────────────────────────────────────────────────────────

/// A dispute over one credential of one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeCase {
    /// Caller-chosen case identifier.
    pub case_id: String,
    #[serde(rename = "subject_did")]
    pub subject_id: String,
    /// Credential under dispute.
    pub credential_id: String,
    /// Why the case was opened.
    pub reason: String,
    #[serde(rename = "opened_utc")]
    pub opened_at: Timestamp,
    /// DID that opened the case.
    pub opened_by: String,
    /// Current status; always the last event's `to_status`.
    pub status: DisputeStatus,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    /// Every proof id accepted so far.
    #[serde(rename = "used_auth_proof_ids", default)]
    pub used_proof_ids: BTreeSet<String>,
    /// Events in order, genesis first.
    pub history: Vec<DisputeEvent>,
}

impl DisputeCase {
    /// Apply a transition; see [`transition`].
    pub fn transition(
        &mut self,
        to_status: DisputeStatus,
        actor: &str,
        note: &str,
        options: TransitionOptions<'_>,
    ) -> Result<&DisputeEvent, DisputeError> {
        transition(self, to_status, actor, note, options)
    }

    /// Run the history integrity checks.
    pub fn verify_integrity(&self) -> IntegrityReport {
        verify_case_history_integrity(self)
    }

    /// Most recent event; `None` only for a case built by hand with no history.
    pub fn last_event(&self) -> Option<&DisputeEvent> {
        self.history.last()
    }
}

/// Open a case now.
pub fn open_case(
    case_id: &str,
    subject_id: &str,
    credential_id: &str,
    opened_by: &str,
    reason: &str,
    evidence_refs: Vec<String>,
) -> DisputeCase {
    open_case_at(
        case_id,
        subject_id,
        credential_id,
        opened_by,
        reason,
        evidence_refs,
        Timestamp::now(),
    )
}

/// Open a case with an explicit opening time.
pub fn open_case_at(
    case_id: &str,
    subject_id: &str,
    credential_id: &str,
    opened_by: &str,
    reason: &str,
    evidence_refs: Vec<String>,
    opened_at: Timestamp,
) -> DisputeCase {
    let genesis = DisputeEvent {
        event_id: event_id(case_id, 0),
        seq: 0,
        timestamp: opened_at,
        actor: opened_by.to_string(),
        actor_role: DidSuffixRoleResolver.resolve(opened_by),
        from_status: None,
        to_status: DisputeStatus::Opened,
        note: GENESIS_NOTE.to_string(),
        evidence_refs: evidence_refs.clone(),
        auth_proof_id: None,
        signer: None,
        verification_method_id: None,
        payload_digest: None,
        signature_verified: false,
    };
    tracing::info!(case_id, subject = subject_id, opened_by, "dispute case opened");
    DisputeCase {
        case_id: case_id.to_string(),
        subject_id: subject_id.to_string(),
        credential_id: credential_id.to_string(),
        reason: reason.to_string(),
        opened_at,
        opened_by: opened_by.to_string(),
        status: DisputeStatus::Opened,
        evidence_refs,
        used_proof_ids: BTreeSet::new(),
        history: vec![genesis],
    }
}

// ── Options ─────────────────────────────────────────────────────────────

/// Authorization and bookkeeping options for one transition.
///
/// `Default` turns every enforcement layer off; [`TransitionOptions::strict`]
/// turns them all on.
#[derive(Clone, Default)]
pub struct TransitionOptions<'a> {
    /// Explicit role; skips role inference.
    pub actor_role: Option<ActorRole>,
    /// Check the actor's role against the target status.
    pub enforce_actor_policy: bool,
    /// Proof presented with this transition.
    pub auth_proof: Option<AuthProof>,
    /// Refuse the transition when no proof is presented.
    pub require_auth_proof: bool,
    /// Require the proof's signer to be the acting DID.
    pub enforce_signer_match: bool,
    /// Refuse proof ids the case has already accepted.
    pub reject_replayed_proof: bool,
    /// Source of verification methods for signature checks.
    pub verification_method_resolver: Option<&'a dyn VerificationMethodResolver>,
    /// Require a valid HMAC signature over the transition payload.
    pub require_signature_verification: bool,
    /// Role inference; defaults to [`DidSuffixRoleResolver`].
    pub role_resolver: Option<&'a dyn RoleResolver>,
    /// Evidence references recorded on the event.
    pub evidence_refs: Vec<String>,
    /// Explicit event time; must not precede the last event.
    pub at: Option<Timestamp>,
}

impl<'a> TransitionOptions<'a> {
    /// Every enforcement layer on, verifying signatures with `resolver`.
    pub fn strict(resolver: &'a dyn VerificationMethodResolver) -> Self {
        Self {
            enforce_actor_policy: true,
            require_auth_proof: true,
            enforce_signer_match: true,
            reject_replayed_proof: true,
            verification_method_resolver: Some(resolver),
            require_signature_verification: true,
            ..Self::default()
        }
    }

    /// Present `proof` with the transition.
    pub fn with_proof(mut self, proof: AuthProof) -> Self {
        self.auth_proof = Some(proof);
        self
    }

    /// Explicit actor role; skips role inference.
    pub fn with_role(mut self, role: ActorRole) -> Self {
        self.actor_role = Some(role);
        self
    }

    /// Explicit role from a token; unrecognized tokens become `Unknown`.
    pub fn with_role_token(self, token: &str) -> Self {
        self.with_role(ActorRole::from_token(token))
    }

    /// Infer roles with `resolver` instead of the DID-suffix default.
    pub fn with_role_resolver(mut self, resolver: &'a dyn RoleResolver) -> Self {
        self.role_resolver = Some(resolver);
        self
    }

    /// Evidence references to record on the event.
    pub fn with_evidence(mut self, refs: Vec<String>) -> Self {
        self.evidence_refs = refs;
        self
    }

    /// Stamp the event with `at` instead of the current time.
    pub fn at(mut self, at: Timestamp) -> Self {
        self.at = Some(at);
        self
    }
}

impl std::fmt::Debug for TransitionOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionOptions")
            .field("actor_role", &self.actor_role)
            .field("enforce_actor_policy", &self.enforce_actor_policy)
            .field("auth_proof", &self.auth_proof.as_ref().map(|p| &p.proof_id))
            .field("require_auth_proof", &self.require_auth_proof)
            .field("enforce_signer_match", &self.enforce_signer_match)
            .field("reject_replayed_proof", &self.reject_replayed_proof)
            .field(
                "verification_method_resolver",
                &self.verification_method_resolver.is_some(),
            )
            .field(
                "require_signature_verification",
                &self.require_signature_verification,
            )
            .field("role_resolver", &self.role_resolver.is_some())
            .field("evidence_refs", &self.evidence_refs)
            .field("at", &self.at)
            .finish()
    }
}

// ── Transition ──────────────────────────────────────────────────────────

/// Move `case` to `to_status`, or reject without touching it.
pub fn transition<'c>(
    case: &'c mut DisputeCase,
    to_status: DisputeStatus,
    actor: &str,
    note: &str,
    options: TransitionOptions<'_>,
) -> Result<&'c DisputeEvent, DisputeError> {
    let event = match authorize(case, to_status, actor, note, &options) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(
                case_id = %case.case_id,
                from = %case.status,
                to = %to_status,
                actor,
                error = %err,
                "dispute transition rejected"
            );
            return Err(err);
        }
    };

    tracing::info!(
        case_id = %case.case_id,
        from = %case.status,
        to = %to_status,
        actor,
        role = %event.actor_role,
        seq = event.seq,
        proof_id = event.auth_proof_id.as_deref().unwrap_or(""),
        signature_verified = event.signature_verified,
        "dispute transition accepted"
    );

    if let Some(proof_id) = &event.auth_proof_id {
        case.used_proof_ids.insert(proof_id.clone());
    }
    case.status = to_status;
    let index = case.history.len();
    case.history.push(event);
    Ok(&case.history[index])
}

/// Every check of a transition; builds the event without mutating the case.
fn authorize(
    case: &DisputeCase,
    to_status: DisputeStatus,
    actor: &str,
    note: &str,
    options: &TransitionOptions<'_>,
) -> Result<DisputeEvent, DisputeError> {
    let from = case.status;
    if !from.can_transition_to(to_status) {
        return Err(DisputeError::InvalidTransition { from, to: to_status });
    }

    let role = match options.actor_role {
        Some(role) => role,
        None => options
            .role_resolver
            .unwrap_or(&DidSuffixRoleResolver)
            .resolve(actor),
    };

    let proof = options.auth_proof.as_ref();
    match proof {
        Some(proof) => {
            let missing = proof.missing_fields();
            if !missing.is_empty() {
                return Err(PermissionDenied::IncompleteProof(missing).into());
            }
            if options.enforce_signer_match && proof.signer != actor {
                return Err(PermissionDenied::SignerMismatch {
                    signer: proof.signer.clone(),
                    actor: actor.to_string(),
                }
                .into());
            }
        }
        None if options.require_auth_proof => {
            return Err(PermissionDenied::MissingProof { from, to: to_status }.into());
        }
        None => {}
    }

    if options.enforce_actor_policy && !allowed_roles(from, to_status).contains(&role) {
        return Err(PermissionDenied::UnauthorizedRole {
            role,
            from,
            to: to_status,
        }
        .into());
    }

    if let Some(proof) = proof {
        if options.reject_replayed_proof && case.used_proof_ids.contains(&proof.proof_id) {
            return Err(PermissionDenied::ReplayedProof(proof.proof_id.clone()).into());
        }
    }

    let payload = TransitionPayload::for_next(case, actor, to_status, note)?;
    let seq = payload.event_seq;

    let mut signature_verified = false;
    let mut verification_method_id = proof.and_then(|p| p.verification_method_id.clone());
    let mut payload_digest = proof.and_then(|p| p.payload_digest.clone());
    let verify = options.require_signature_verification
        || (proof.is_some() && options.verification_method_resolver.is_some());
    if verify {
        let proof = proof.ok_or(PermissionDenied::MissingProof { from, to: to_status })?;
        let digest = payload.digest_hex()?;
        let method_id =
            verify_proof_signature(proof, &digest, options.verification_method_resolver)?;
        signature_verified = true;
        verification_method_id = Some(method_id);
        payload_digest = Some(digest);
    }

    let last = case.history.last().map(|e| e.timestamp);
    let timestamp = match (options.at, last) {
        (Some(at), Some(last)) if at < last => {
            return Err(DisputeError::TimestampRegression { at, last });
        }
        (Some(at), _) => at,
        (None, Some(last)) => Timestamp::now().max(last),
        (None, None) => Timestamp::now(),
    };

    Ok(DisputeEvent {
        event_id: event_id(&case.case_id, seq),
        seq,
        timestamp,
        actor: actor.to_string(),
        actor_role: role,
        from_status: Some(from),
        to_status,
        note: note.to_string(),
        evidence_refs: options.evidence_refs.clone(),
        auth_proof_id: proof.map(|p| p.proof_id.clone()),
        signer: proof.map(|p| p.signer.clone()),
        verification_method_id,
        payload_digest,
        signature_verified,
    })
}
