//! # Presentation Validation
//!
//! Works on the external JSON form so that presentations produced elsewhere
//! (or edited after the fact) can be checked. Checks run in a fixed order and
//! the first violation wins:
//!
//! 1. every required key present
//! 2. `requested_fields` is a list, `disclosed_claims` an object,
//!    `denied_sensitive_fields` a list
//! 3. disclosed keys are a subset of the requested fields
//! 4. no disclosed key is sensitive without allowance
//! 5. every denied field is marked sensitive by the policy
//!
//! Each violation renders as a stable reason tag, e.g.
//! `disclosed_fields_not_requested=["email"]`.

use std::collections::BTreeSet;

use serde_json::Value;

use freed_core::FreedError;

use crate::policy::MinimumDisclosurePolicy;

/// Reason reported for a presentation that passes every check.
pub const PRESENTATION_VALID: &str = "presentation_valid";

const REQUIRED_KEYS: [&str; 8] = [
    "subject_did",
    "credential_id",
    "requested_fields",
    "disclosed_claims",
    "redacted_fields",
    "denied_sensitive_fields",
    "policy_version",
    "created_utc",
];

/// First rule a presentation breaks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisclosureViolation {
    #[error("presentation must be a JSON object: {0}")]
    Malformed(String),

    #[error("missing_required_fields={}", render(.0))]
    MissingRequiredFields(Vec<String>),

    #[error("{field}_must_be_{expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("disclosed_fields_not_requested={}", render(.0))]
    DisclosedNotRequested(Vec<String>),

    #[error("sensitive_fields_disclosed_without_allowance={}", render(.0))]
    SensitiveWithoutAllowance(Vec<String>),

    #[error("denied_sensitive_fields_not_marked_sensitive={}", render(.0))]
    DeniedNotSensitive(Vec<String>),
}

impl DisclosureViolation {
    /// Stable reason tag (same as `Display`).
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<DisclosureViolation> for FreedError {
    fn from(v: DisclosureViolation) -> Self {
        match v {
            DisclosureViolation::Malformed(_)
            | DisclosureViolation::MissingRequiredFields(_)
            | DisclosureViolation::WrongType { .. } => FreedError::Schema(v.to_string()),
            _ => FreedError::Validation(v.to_string()),
        }
    }
}

fn render(fields: &[String]) -> String {
    serde_json::to_string(fields).unwrap_or_default()
}

/// Validate a presentation in external form against `policy`.
pub fn validate_presentation(
    presentation: &Value,
    policy: &MinimumDisclosurePolicy,
) -> Result<(), DisclosureViolation> {
    let obj = presentation.as_object().ok_or_else(|| {
        DisclosureViolation::Malformed(format!("got {}", type_name(presentation)))
    })?;

    let mut missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|k| !obj.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(DisclosureViolation::MissingRequiredFields(missing));
    }

    let requested = obj["requested_fields"]
        .as_array()
        .ok_or(DisclosureViolation::WrongType {
            field: "requested_fields",
            expected: "a_list",
        })?;
    let disclosed = obj["disclosed_claims"]
        .as_object()
        .ok_or(DisclosureViolation::WrongType {
            field: "disclosed_claims",
            expected: "an_object",
        })?;
    let denied = obj["denied_sensitive_fields"]
        .as_array()
        .ok_or(DisclosureViolation::WrongType {
            field: "denied_sensitive_fields",
            expected: "a_list",
        })?;

    let requested_set: BTreeSet<String> = requested.iter().map(field_name).collect();
    let disclosed_set: BTreeSet<String> = disclosed.keys().cloned().collect();

    let not_requested: Vec<String> = disclosed_set.difference(&requested_set).cloned().collect();
    if !not_requested.is_empty() {
        return Err(DisclosureViolation::DisclosedNotRequested(not_requested));
    }

    let leaked: Vec<String> = disclosed_set
        .iter()
        .filter(|f| policy.is_denied(f))
        .cloned()
        .collect();
    if !leaked.is_empty() {
        return Err(DisclosureViolation::SensitiveWithoutAllowance(leaked));
    }

    let unmarked: Vec<String> = denied
        .iter()
        .map(field_name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|f| !policy.is_sensitive(f))
        .collect();
    if !unmarked.is_empty() {
        return Err(DisclosureViolation::DeniedNotSensitive(unmarked));
    }

    Ok(())
}

fn field_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
