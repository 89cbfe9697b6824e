//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` is UTC, truncated to whole seconds, and renders as
//! `YYYY-MM-DDTHH:MM:SSZ`. Ledger `timestamp_utc`, dispute `at_utc` /
//! `opened_utc`, and presentation `created_utc` all use it, so the same
//! instant always canonicalizes to the same bytes.
//!
//! Serialization always emits the `Z` form. Deserialization is lenient and
//! accepts any RFC 3339 offset (records written by other tooling often use
//! `+00:00`), converting to UTC.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FreedError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a strict `Z`-suffixed RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`FreedError::Schema`] if the string is not RFC 3339 or uses
    /// a non-`Z` offset.
    pub fn parse(s: &str) -> Result<Self, FreedError> {
        if !s.ends_with('Z') {
            return Err(FreedError::Schema(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        Self::parse_lenient(s)
    }

    /// Parse any RFC 3339 timestamp, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, FreedError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| FreedError::Schema(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, FreedError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| FreedError::Schema(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO 8601 with `Z` suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_lenient(&s).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
