//! # Case History Integrity
//!
//! Re-derives everything a case's history implies and reports every
//! disagreement, not just the first. Used on cases loaded from storage where
//! the in-memory invariants of [`transition`](crate::transition) no longer
//! hold by construction.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::case::{event_id, DisputeCase};
use crate::proof::TransitionPayload;
use crate::status::DisputeStatus;

/// Outcome of [`verify_case_history_integrity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub ok: bool,
    /// One token per problem, e.g. `replayed_auth_proof_at_index=3`.
    pub errors: Vec<String>,
}

impl IntegrityReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }
}

/// Check a case's history against its recorded state.
pub fn verify_case_history_integrity(case: &DisputeCase) -> IntegrityReport {
    let mut errors = Vec::new();

    let Some(genesis) = case.history.first() else {
        return IntegrityReport::from_errors(vec!["empty_history".to_string()]);
    };
    if genesis.from_status.is_some() || genesis.to_status != DisputeStatus::Opened {
        errors.push("invalid_genesis_event".to_string());
    }

    let mut seen_proofs = BTreeSet::new();
    let mut prev_status: Option<DisputeStatus> = None;
    let mut prev_time = None;

    for (index, event) in case.history.iter().enumerate() {
        let seq = u32::try_from(index).unwrap_or(u32::MAX);
        if event.seq != seq {
            errors.push(format!("event_seq_mismatch_at_index={index}"));
        }
        if event.event_id != event_id(&case.case_id, seq) {
            errors.push(format!("event_id_mismatch_at_index={index}"));
        }

        if index > 0 {
            if event.from_status != prev_status {
                errors.push(format!("status_chain_break_at_index={index}"));
            } else if let Some(from) = event.from_status {
                if !from.can_transition_to(event.to_status) {
                    errors.push(format!("invalid_transition_at_index={index}"));
                }
            }
        }
        prev_status = Some(event.to_status);

        if let Some(prev) = prev_time {
            if event.timestamp < prev {
                errors.push(format!("timestamp_regression_at_index={index}"));
            }
        }
        prev_time = Some(event.timestamp);

        let Some(proof_id) = event.auth_proof_id.as_deref() else {
            continue;
        };
        if !seen_proofs.insert(proof_id) {
            errors.push(format!("replayed_auth_proof_at_index={index}"));
        }
        if !event.signature_verified {
            errors.push(format!("unverified_auth_proof_at_index={index}"));
        }
        if event
            .verification_method_id
            .as_deref()
            .map_or(true, |m| m.trim().is_empty())
        {
            errors.push(format!("missing_verification_method_at_index={index}"));
        }
        match (event.payload_digest.as_deref(), event.from_status) {
            (Some(recorded), Some(from)) => {
                let payload = TransitionPayload {
                    actor: &event.actor,
                    case_id: &case.case_id,
                    credential_id: &case.credential_id,
                    event_seq: seq,
                    from_status: from,
                    note: &event.note,
                    subject_id: &case.subject_id,
                    to_status: event.to_status,
                };
                match payload.digest_hex() {
                    Ok(expected) if expected == recorded => {}
                    _ => errors.push(format!("payload_digest_mismatch_at_index={index}")),
                }
            }
            _ => errors.push(format!("missing_payload_digest_at_index={index}")),
        }
    }

    if prev_status != Some(case.status) {
        errors.push("final_status_mismatch".to_string());
    }
    let seen: BTreeSet<String> = seen_proofs.into_iter().map(str::to_string).collect();
    if seen != case.used_proof_ids {
        errors.push("used_proof_ids_mismatch".to_string());
    }

    if !errors.is_empty() {
        tracing::warn!(case_id = %case.case_id, errors = errors.len(), "case history integrity failed");
    }
    IntegrityReport::from_errors(errors)
}
