//! # Minimum Disclosure
//!
//! Presentations built from registry-held credentials, validation of edited
//! external forms, and property tests over arbitrary claim sets.

use std::collections::BTreeSet;

use freed_cli::disclosure::validate_file;
use freed_core::{ErrorCategory, FreedError, Timestamp};
use freed_disclosure::{
    build_presentation_at, validate_presentation, DisclosureViolation, MinimumDisclosurePolicy,
    DEFAULT_SENSITIVE_FIELDS,
};
use freed_ledger::LedgerConfig;
use freed_registry::{DidDocument, IdentityRegistry, RegistryError};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn claims(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Registry-held credentials
// ---------------------------------------------------------------------------

#[test]
fn sensitive_field_denied_unless_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::at(dir.path().join("audit.jsonl"));
    let registry = IdentityRegistry::with_ledger_config(&config).unwrap();
    let did = registry
        .register(DidDocument::unassigned("did:freed:controller"))
        .unwrap();
    let cred = registry
        .issue_credential(
            &did,
            claims(json!({"age_over_18": true, "government_id": "SECRET-ID", "region": "north"})),
        )
        .unwrap();

    let requested = fields(&["age_over_18", "government_id"]);
    let policy = MinimumDisclosurePolicy::default();
    let presentation = registry
        .build_credential_presentation(&did, &cred, &requested, &policy)
        .unwrap();

    assert_eq!(presentation.disclosed_claims, claims(json!({"age_over_18": true})));
    assert_eq!(
        presentation.denied_sensitive_fields,
        BTreeSet::from(["government_id".to_string()])
    );
    assert_eq!(
        presentation.redacted_fields,
        BTreeSet::from(["government_id".to_string(), "region".to_string()])
    );
    assert_eq!(presentation.requested_fields, requested);
    assert!(presentation.validate(&policy).is_ok());

    let allowing = MinimumDisclosurePolicy::default().allowing(["government_id"]);
    let revealed = registry
        .build_credential_presentation(&did, &cred, &requested, &allowing)
        .unwrap();
    assert_eq!(revealed.disclosed_claims["government_id"], "SECRET-ID");
    assert!(revealed.denied_sensitive_fields.is_empty());
    assert!(revealed.validate(&allowing).is_ok());
    // The same presentation fails under the stricter policy.
    assert_eq!(
        revealed.validate(&policy).unwrap_err(),
        DisclosureViolation::SensitiveWithoutAllowance(vec!["government_id".into()])
    );

    // Requested field names reach the ledger; claim values never do.
    let ledger = registry.ledger().unwrap();
    let entries = ledger.entries().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[2].action, "build_presentation");
    assert_eq!(entries[2].details["requested_fields"], json!(["age_over_18", "government_id"]));
    let text = std::fs::read_to_string(&config.path).unwrap();
    assert!(!text.contains("SECRET-ID"));
    assert_eq!(ledger.verify_integrity().unwrap(), 4);
}

#[test]
fn unknown_credential_is_not_found() {
    let registry = IdentityRegistry::new();
    let did = registry
        .register(DidDocument::unassigned("did:freed:controller"))
        .unwrap();
    let err = registry
        .build_credential_presentation(
            &did,
            &format!("{did}#cred-9"),
            &fields(&["age_over_18"]),
            &MinimumDisclosurePolicy::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RegistryError::CredentialNotFound(_)));
}

// ---------------------------------------------------------------------------
// Edited external forms
// ---------------------------------------------------------------------------

fn external_form() -> Value {
    build_presentation_at(
        "did:freed:subject-001",
        "did:freed:subject-001#cred-0",
        &claims(json!({"age_over_18": true, "email": "a@example.org", "country": "NZ"})),
        ["age_over_18", "email"],
        &MinimumDisclosurePolicy::default(),
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
    )
    .to_value()
    .unwrap()
}

#[test]
fn external_form_shape() {
    let value = external_form();
    assert_eq!(value["created_utc"], "2026-01-15T12:00:00Z");
    assert_eq!(value["policy_version"], "v0");
    assert_eq!(value["denied_sensitive_fields"], json!(["email"]));
    assert_eq!(value["redacted_fields"], json!(["country", "email"]));
    let report = validate_file(&value, &MinimumDisclosurePolicy::default());
    assert!(report.passed());
    assert_eq!(report.checks()[0].detail, "presentation_valid");
}

#[test]
fn injected_claim_is_reported_as_unrequested() {
    let mut value = external_form();
    value["disclosed_claims"]["country"] = json!("NZ");
    let violation = validate_presentation(&value, &MinimumDisclosurePolicy::default()).unwrap_err();
    assert_eq!(violation.reason(), r#"disclosed_fields_not_requested=["country"]"#);
    assert_eq!(FreedError::from(violation).category(), ErrorCategory::Validation);
}

#[test]
fn moved_sensitive_claim_is_reported_as_leak() {
    let mut value = external_form();
    value["disclosed_claims"]["email"] = json!("a@example.org");
    value["denied_sensitive_fields"] = json!([]);
    let report = validate_file(&value, &MinimumDisclosurePolicy::default());
    assert!(!report.passed());
    assert_eq!(
        report.checks()[0].detail,
        r#"sensitive_fields_disclosed_without_allowance=["email"]"#
    );
}

#[test]
fn structural_edits_are_schema_errors() {
    let mut missing = external_form();
    missing.as_object_mut().unwrap().remove("policy_version");
    missing.as_object_mut().unwrap().remove("created_utc");
    let violation = validate_presentation(&missing, &MinimumDisclosurePolicy::default()).unwrap_err();
    assert_eq!(violation.reason(), r#"missing_required_fields=["created_utc","policy_version"]"#);
    assert_eq!(FreedError::from(violation).category(), ErrorCategory::Schema);

    let mut retyped = external_form();
    retyped["disclosed_claims"] = json!(["age_over_18"]);
    assert_eq!(
        validate_presentation(&retyped, &MinimumDisclosurePolicy::default())
            .unwrap_err()
            .reason(),
        "disclosed_claims_must_be_an_object"
    );
}

#[test]
fn denied_field_outside_policy_is_flagged() {
    let value = external_form();
    let narrow = MinimumDisclosurePolicy::default().with_sensitive_fields(["government_id"]);
    // "email" is no longer sensitive, so its denial is unexplained.
    assert_eq!(
        validate_presentation(&value, &narrow).unwrap_err(),
        DisclosureViolation::DeniedNotSensitive(vec!["email".into()])
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn field_name() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(DEFAULT_SENSITIVE_FIELDS.to_vec()).prop_map(str::to_string),
        "[a-z]{1,8}(_[a-z]{1,6})?",
    ]
}

proptest! {
    #[test]
    fn disclosure_never_exceeds_request_or_policy(
        claim_names in proptest::collection::btree_set(field_name(), 0..12),
        requested in proptest::collection::vec(field_name(), 0..12),
        allowed in proptest::collection::btree_set(field_name(), 0..4),
    ) {
        let claim_map: Map<String, Value> = claim_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), json!(i)))
            .collect();
        let policy = MinimumDisclosurePolicy::default().allowing(allowed.iter().cloned());
        let presentation = build_presentation_at(
            "did:freed:prop",
            "did:freed:prop#cred-0",
            &claim_map,
            requested.iter().cloned(),
            &policy,
            Timestamp::now(),
        );

        let requested_set: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
        for field in presentation.disclosed_fields() {
            prop_assert!(requested_set.contains(field));
            prop_assert!(!policy.is_denied(field));
        }
        for field in &presentation.denied_sensitive_fields {
            prop_assert!(policy.is_denied(field));
            prop_assert!(presentation.redacted_fields.contains(field));
            prop_assert!(!presentation.disclosed_claims.contains_key(field));
        }
        // Every claim lands in exactly one of disclosed or redacted.
        prop_assert_eq!(
            presentation.disclosed_claims.len() + presentation.redacted_fields.len(),
            claim_map.len()
        );
        prop_assert!(presentation.validate(&policy).is_ok());
    }
}
