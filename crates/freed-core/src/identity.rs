//! # Decentralized Identifiers
//!
//! `Did` is a validated `did:<method>:<identifier>` string. The registry keys
//! documents by it; the ledger and the dispute engine keep plain strings at
//! their boundaries and only reference DIDs.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FreedError;

/// A W3C decentralized identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`FreedError::Validation`] unless the string is
    /// `did:<method>:<identifier>` with a lowercase alphanumeric method and a
    /// non-empty identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, FreedError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), FreedError> {
        let invalid =
            || FreedError::Validation(format!("invalid DID format: {s:?} (expected did:<method>:<identifier>)"));
        let rest = s.strip_prefix("did:").ok_or_else(invalid)?;
        let (method, identifier) = rest.split_once(':').ok_or_else(invalid)?;
        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if identifier.is_empty() {
            return Err(invalid());
        }
        Ok(())
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method (between the first and second colons).
    pub fn method(&self) -> &str {
        self.0
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .map(|(method, _)| method)
            .unwrap_or_default()
    }

    /// The method-specific identifier (everything after the method).
    pub fn identifier(&self) -> &str {
        self.0
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .map(|(_, id)| id)
            .unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_freed_dids() {
        let did = Did::new("did:freed:reviewer-1").unwrap();
        assert_eq!(did.method(), "freed");
        assert_eq!(did.identifier(), "reviewer-1");
        assert_eq!(did.to_string(), "did:freed:reviewer-1");
    }

    #[test]
    fn identifier_may_contain_colons() {
        let did = Did::new("did:web:example.com:users:alice").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.identifier(), "example.com:users:alice");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "did:", "did:freed", "did::abc", "did:FREED:abc", "urn:freed:abc", "did:freed:"] {
            assert!(Did::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Did>("\"did:freed:x\"").is_ok());
        assert!(serde_json::from_str::<Did>("\"not-a-did\"").is_err());
    }
}
