//! Disclosure policy configuration.
//!
//! Lets a deployment change the policy version and the sensitive / allowed
//! field sets without code changes. Unset variables keep the defaults from
//! [`MinimumDisclosurePolicy::default`].

use std::collections::BTreeSet;

use crate::policy::MinimumDisclosurePolicy;

/// Environment-driven disclosure settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisclosureConfig {
    /// Overrides the policy version tag.
    pub policy_version: Option<String>,
    /// Replaces the default sensitive set.
    pub sensitive_fields: Option<BTreeSet<String>>,
    /// Sensitive fields that may be disclosed when requested.
    pub allowed_sensitive_fields: BTreeSet<String>,
}

impl DisclosureConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FREED_DISCLOSURE_POLICY_VERSION` (default: `v0`)
    /// - `FREED_SENSITIVE_FIELDS` (comma list; default: the built-in sensitive set)
    /// - `FREED_ALLOWED_SENSITIVE_FIELDS` (comma list; default: empty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let policy_version = match lookup("FREED_DISCLOSURE_POLICY_VERSION") {
            Some(v) if v.trim().is_empty() => {
                return Err(ConfigError::Empty("FREED_DISCLOSURE_POLICY_VERSION".into()))
            }
            Some(v) => Some(v.trim().to_string()),
            None => None,
        };
        let sensitive_fields = match lookup("FREED_SENSITIVE_FIELDS") {
            Some(raw) => {
                let fields = parse_list(&raw);
                if fields.is_empty() {
                    return Err(ConfigError::Empty("FREED_SENSITIVE_FIELDS".into()));
                }
                Some(fields)
            }
            None => None,
        };
        let allowed_sensitive_fields = lookup("FREED_ALLOWED_SENSITIVE_FIELDS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            policy_version,
            sensitive_fields,
            allowed_sensitive_fields,
        })
    }

    /// The policy these settings describe.
    pub fn policy(&self) -> MinimumDisclosurePolicy {
        let mut policy = MinimumDisclosurePolicy::default();
        if let Some(version) = &self.policy_version {
            policy = policy.with_version(version.clone());
        }
        if let Some(fields) = &self.sensitive_fields {
            policy = policy.with_sensitive_fields(fields.iter().cloned());
        }
        policy.allowing(self.allowed_sensitive_fields.iter().cloned())
    }
}

/// Split a comma list, trimming entries and dropping empties.
pub fn parse_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(String),
}
