//! # Presentations
//!
//! External form:
//!
//! ```json
//! {
//!   "subject_did": "did:freed:...",
//!   "credential_id": "did:freed:...#cred-0",
//!   "requested_fields": ["age_over_18", "government_id"],
//!   "disclosed_claims": {"age_over_18": true},
//!   "redacted_fields": ["government_id"],
//!   "denied_sensitive_fields": ["government_id"],
//!   "policy_version": "v0",
//!   "created_utc": "2026-01-15T12:00:00Z"
//! }
//! ```

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use freed_core::Timestamp;

use crate::policy::MinimumDisclosurePolicy;
use crate::validate::{validate_presentation, DisclosureViolation};

/// A filtered view of one credential's claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(rename = "subject_did")]
    pub subject_id: String,
    pub credential_id: String,
    /// Requested field names in the order the verifier asked for them.
    pub requested_fields: Vec<String>,
    pub disclosed_claims: Map<String, Value>,
    pub redacted_fields: BTreeSet<String>,
    /// Requested fields withheld because they are sensitive and not allowed.
    pub denied_sensitive_fields: BTreeSet<String>,
    pub policy_version: String,
    #[serde(rename = "created_utc")]
    pub created_at: Timestamp,
}

impl Presentation {
    /// External JSON form.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Validate the external form of this presentation against `policy`.
    pub fn validate(&self, policy: &MinimumDisclosurePolicy) -> Result<(), DisclosureViolation> {
        let value = self
            .to_value()
            .map_err(|e| DisclosureViolation::Malformed(e.to_string()))?;
        validate_presentation(&value, policy)
    }

    pub fn disclosed_fields(&self) -> impl Iterator<Item = &str> {
        self.disclosed_claims.keys().map(String::as_str)
    }
}

/// Build a presentation stamped with the current time.
pub fn build_presentation<I, S>(
    subject_id: &str,
    credential_id: &str,
    claims: &Map<String, Value>,
    requested_fields: I,
    policy: &MinimumDisclosurePolicy,
) -> Presentation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    build_presentation_at(
        subject_id,
        credential_id,
        claims,
        requested_fields,
        policy,
        Timestamp::now(),
    )
}

/// Build a presentation with an explicit creation time.
///
/// Deterministic in its inputs. Requested fields absent from `claims` are
/// simply not disclosed; they appear in neither the redacted nor the denied
/// set.
pub fn build_presentation_at<I, S>(
    subject_id: &str,
    credential_id: &str,
    claims: &Map<String, Value>,
    requested_fields: I,
    policy: &MinimumDisclosurePolicy,
    created_at: Timestamp,
) -> Presentation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let requested: Vec<String> = requested_fields.into_iter().map(Into::into).collect();
    let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();

    let mut disclosed_claims = Map::new();
    let mut redacted_fields = BTreeSet::new();
    let mut denied_sensitive_fields = BTreeSet::new();

    for (name, value) in claims {
        if !requested_set.contains(name.as_str()) {
            redacted_fields.insert(name.clone());
        } else if policy.is_denied(name) {
            denied_sensitive_fields.insert(name.clone());
            redacted_fields.insert(name.clone());
        } else {
            disclosed_claims.insert(name.clone(), value.clone());
        }
    }

    tracing::debug!(
        subject = subject_id,
        credential = credential_id,
        policy_version = %policy.version,
        requested = requested.len(),
        disclosed = disclosed_claims.len(),
        redacted = redacted_fields.len(),
        denied = denied_sensitive_fields.len(),
        "presentation built"
    );

    Presentation {
        subject_id: subject_id.to_string(),
        credential_id: credential_id.to_string(),
        requested_fields: requested,
        disclosed_claims,
        redacted_fields,
        denied_sensitive_fields,
        policy_version: policy.version.clone(),
        created_at,
    }
}
