//! Disclosure policy: which claim names are sensitive and which of those a
//! particular request may see.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Version tag stamped on presentations built under the default policy.
pub const DEFAULT_POLICY_VERSION: &str = "v0";

/// Claim names treated as sensitive unless a policy says otherwise.
pub const DEFAULT_SENSITIVE_FIELDS: [&str; 7] = [
    "full_name",
    "legal_name",
    "government_id",
    "birth_date",
    "email",
    "phone",
    "home_address",
];

/// Per-request minimum-disclosure policy. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumDisclosurePolicy {
    #[serde(rename = "policy_version")]
    pub version: String,
    /// Claim names withheld unless explicitly allowed.
    pub sensitive_fields: BTreeSet<String>,
    /// Sensitive claim names this request may see.
    pub allowed_sensitive_fields: BTreeSet<String>,
}

impl Default for MinimumDisclosurePolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            sensitive_fields: DEFAULT_SENSITIVE_FIELDS.iter().map(|s| s.to_string()).collect(),
            allowed_sensitive_fields: BTreeSet::new(),
        }
    }
}

impl MinimumDisclosurePolicy {
    /// Replace the version tag stamped on presentations.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the sensitive set.
    pub fn with_sensitive_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Allow the given sensitive fields to be disclosed when requested.
    pub fn allowing<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sensitive_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Whether `field` is in the sensitive set, allowed or not.
    pub fn is_sensitive(&self, field: &str) -> bool {
        self.sensitive_fields.contains(field)
    }

    /// Sensitive and not explicitly allowed.
    pub fn is_denied(&self, field: &str) -> bool {
        self.is_sensitive(field) && !self.allowed_sensitive_fields.contains(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = MinimumDisclosurePolicy::default();
        assert_eq!(policy.version, "v0");
        assert_eq!(policy.sensitive_fields.len(), 7);
        assert!(policy.is_denied("government_id"));
        assert!(!policy.is_denied("age_over_18"));
    }

    #[test]
    fn allowance_lifts_denial() {
        let policy = MinimumDisclosurePolicy::default().allowing(["email"]);
        assert!(policy.is_sensitive("email"));
        assert!(!policy.is_denied("email"));
        assert!(policy.is_denied("phone"));
    }

    #[test]
    fn allowing_a_non_sensitive_field_is_harmless() {
        let policy = MinimumDisclosurePolicy::default()
            .with_sensitive_fields(["ssn"])
            .allowing(["nickname"]);
        assert!(!policy.is_denied("nickname"));
        assert!(policy.is_denied("ssn"));
        assert!(!policy.is_sensitive("email"));
    }

    #[test]
    fn serializes_version_as_policy_version() {
        let value = serde_json::to_value(MinimumDisclosurePolicy::default().with_version("v1")).unwrap();
        assert_eq!(value["policy_version"], "v1");
        assert!(value["allowed_sensitive_fields"].as_array().unwrap().is_empty());
    }
}
