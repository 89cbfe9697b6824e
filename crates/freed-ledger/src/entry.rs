//! # Ledger Entries
//!
//! The persisted record is a flat JSON object:
//!
//! ```json
//! {"action":"register","details":{...},"did":"did:freed:...","entry_hash":"...","index":0,"prev_hash":"000...","timestamp_utc":"2026-01-15T12:00:00Z"}
//! ```
//!
//! The hash covers every key except `prev_hash` and `entry_hash`, prefixed by
//! the previous entry's hash as a hex string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use freed_core::{CanonicalBytes, CanonicalizationError, Sha256Accumulator, Timestamp};

/// Keys that every persisted record must carry. `details` may be absent and
/// then hashes as `{}`.
pub(crate) const REQUIRED_KEYS: [&str; 6] = [
    "index",
    "timestamp_utc",
    "action",
    "did",
    "prev_hash",
    "entry_hash",
];

/// One entry of the audit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Zero-based position in the log.
    pub index: u64,
    /// Append time, UTC, second precision.
    #[serde(rename = "timestamp_utc")]
    pub timestamp: Timestamp,
    /// Governance action name.
    pub action: String,
    /// Identifier the action concerns (usually a DID).
    #[serde(rename = "did")]
    pub subject_id: String,
    /// Free-form action details.
    #[serde(default)]
    pub details: Map<String, Value>,
    /// `entry_hash` of the previous entry, or 64 zeros for entry 0.
    pub prev_hash: String,
    /// SHA-256 over `prev_hash` and the canonical payload.
    pub entry_hash: String,
}

impl LedgerEntry {
    /// The hashed portion of the entry: everything but the two hash fields.
    pub fn payload(&self) -> Value {
        Value::Object(self.payload_map())
    }

    /// The full persisted record, hashes included.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut obj = self.payload_map();
        obj.insert("prev_hash".into(), Value::String(self.prev_hash.clone()));
        obj.insert("entry_hash".into(), Value::String(self.entry_hash.clone()));
        obj
    }

    fn payload_map(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("index".into(), Value::from(self.index));
        obj.insert(
            "timestamp_utc".into(),
            Value::String(self.timestamp.to_iso8601()),
        );
        obj.insert("action".into(), Value::String(self.action.clone()));
        obj.insert("did".into(), Value::String(self.subject_id.clone()));
        obj.insert("details".into(), Value::Object(self.details.clone()));
        obj
    }

    /// Recompute this entry's hash from its own fields.
    pub fn recompute_hash(&self) -> Result<String, CanonicalizationError> {
        compute_entry_hash(&self.prev_hash, self.payload())
    }
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    /// Position the entry was written at.
    pub index: u64,
    /// Hash the entry chains from.
    pub prev_hash: String,
    /// Hash of the new entry; the next append chains from it.
    pub entry_hash: String,
}

/// `SHA256(prev_hash ++ canonical(payload))` as lowercase hex.
///
/// `prev_hash` is fed as its ASCII hex text, not as decoded bytes.
pub fn compute_entry_hash(prev_hash: &str, payload: Value) -> Result<String, CanonicalizationError> {
    let canonical = CanonicalBytes::from_value(payload)?;
    let mut acc = Sha256Accumulator::new();
    acc.update(prev_hash.as_bytes());
    acc.update(canonical.as_bytes());
    Ok(acc.finalize_hex())
}
