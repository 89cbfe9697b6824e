//! # Audit Ledger
//!
//! Append-only, hash-chained log over a [`LedgerStore`].
//!
//! ## Concurrency
//!
//! The handle keeps no copy of the chain tip. Each append reads the tip from
//! the store and writes the new record inside one [`LedgerStore::append_with`]
//! call, under the handle's `parking_lot::Mutex`. For a [`JsonlFileStore`]
//! that call also holds an exclusive lock on the file, so handles in other
//! threads or processes that share the path extend the same chain instead of
//! forking it. A failed write leaves nothing behind to invalidate.

use parking_lot::Mutex;
use serde_json::{Map, Value};

use freed_core::{CanonicalBytes, FreedError, Timestamp, ZERO_HASH};

use crate::config::LedgerConfig;
use crate::entry::{compute_entry_hash, AppendReceipt, LedgerEntry, REQUIRED_KEYS};
use crate::error::LedgerError;
use crate::store::{JsonlFileStore, LedgerStore, MemoryStore};

/// Why chain verification stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityFailureKind {
    /// Stored `prev_hash` differs from the running chain value.
    PrevHashMismatch,
    /// Recomputed hash differs from the stored `entry_hash`.
    EntryHashMismatch,
    /// A required key is absent or has the wrong JSON type.
    MissingField,
    /// The record is not a JSON object, or its payload cannot be canonicalized.
    MalformedRecord,
    /// The backing store could not be read.
    StoreUnavailable,
}

impl IntegrityFailureKind {
    /// Reason tag used in reports and in [`IntegrityFailure`]'s display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrevHashMismatch => "prev_hash_mismatch",
            Self::EntryHashMismatch => "entry_hash_mismatch",
            Self::MissingField => "missing_field",
            Self::MalformedRecord => "malformed_record",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl std::fmt::Display for IntegrityFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failure found while replaying the chain.
///
/// Displays as the reason tag, e.g. `entry_hash_mismatch_at_index=3`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}_at_index={index}")]
pub struct IntegrityFailure {
    /// Index of the offending record.
    pub index: u64,
    /// What went wrong.
    pub kind: IntegrityFailureKind,
    /// Human-readable detail (expected vs. found, missing key name, ...).
    pub detail: String,
}

impl IntegrityFailure {
    fn new(index: u64, kind: IntegrityFailureKind, detail: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            detail: detail.into(),
        }
    }
}

impl From<IntegrityFailure> for FreedError {
    fn from(failure: IntegrityFailure) -> Self {
        let msg = format!("{failure} ({})", failure.detail);
        match failure.kind {
            IntegrityFailureKind::PrevHashMismatch | IntegrityFailureKind::EntryHashMismatch => {
                FreedError::Integrity(msg)
            }
            IntegrityFailureKind::MissingField | IntegrityFailureKind::MalformedRecord => {
                FreedError::Schema(msg)
            }
            IntegrityFailureKind::StoreUnavailable => {
                FreedError::Io(std::io::Error::other(msg))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ChainTip {
    next_index: u64,
    last_hash: String,
}

impl ChainTip {
    fn of(records: &[String]) -> Result<Self, LedgerError> {
        let tip = match records.last() {
            None => ChainTip {
                next_index: 0,
                last_hash: ZERO_HASH.to_string(),
            },
            Some(raw) => {
                let last_index = records.len() as u64 - 1;
                let value: Value = serde_json::from_str(raw).map_err(|e| LedgerError::Schema {
                    index: last_index,
                    reason: format!("not valid JSON: {e}"),
                })?;
                let last_hash = value
                    .get("entry_hash")
                    .and_then(Value::as_str)
                    .ok_or_else(|| LedgerError::Schema {
                        index: last_index,
                        reason: "missing entry_hash".to_string(),
                    })?;
                ChainTip {
                    next_index: records.len() as u64,
                    last_hash: last_hash.to_string(),
                }
            }
        };
        Ok(tip)
    }
}

/// Append-only, hash-chained audit ledger.
#[derive(Debug)]
pub struct AuditLedger<S = JsonlFileStore> {
    store: Mutex<S>,
}

impl AuditLedger<JsonlFileStore> {
    /// Open the file-backed ledger described by `config`.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = JsonlFileStore::open(&config.path, config.durable)?;
        Ok(Self::new(store))
    }

    /// Open the file-backed ledger configured by the environment.
    pub fn from_env() -> Result<Self, FreedError> {
        let config =
            LedgerConfig::from_env().map_err(|e| FreedError::Validation(e.to_string()))?;
        Ok(Self::open(&config)?)
    }
}

impl AuditLedger<MemoryStore> {
    /// Ledger over an empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: LedgerStore> AuditLedger<S> {
    /// Ledger over `store`. Existing records are kept and extended.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Append an action stamped with the current time.
    ///
    /// `details` must be a JSON object; `null` is taken as `{}`.
    pub fn append(
        &self,
        action: &str,
        subject_id: &str,
        details: Value,
    ) -> Result<AppendReceipt, LedgerError> {
        self.append_at(action, subject_id, details, Timestamp::now())
    }

    /// Append an action with an explicit timestamp.
    pub fn append_at(
        &self,
        action: &str,
        subject_id: &str,
        details: Value,
        timestamp: Timestamp,
    ) -> Result<AppendReceipt, LedgerError> {
        let details = match details {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(LedgerError::InvalidDetails {
                    found: json_type_name(&other),
                })
            }
        };

        let mut store = self.store.lock();
        let written = store.append_with(|records| {
            let tip = ChainTip::of(records)?;
            let mut entry = LedgerEntry {
                index: tip.next_index,
                timestamp,
                action: action.to_string(),
                subject_id: subject_id.to_string(),
                details,
                prev_hash: tip.last_hash,
                entry_hash: String::new(),
            };
            entry.entry_hash = entry.recompute_hash()?;
            let canonical = CanonicalBytes::from_value(Value::Object(entry.to_record()))?;
            let line = String::from_utf8_lossy(canonical.as_bytes()).into_owned();
            Ok((line, entry))
        });

        let entry = match written {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(
                    store = %store.describe(),
                    action,
                    subject = subject_id,
                    error = %e,
                    "audit ledger append failed"
                );
                return Err(e);
            }
        };
        tracing::debug!(
            store = %store.describe(),
            index = entry.index,
            action,
            subject = subject_id,
            entry_hash = %entry.entry_hash,
            "audit ledger entry appended"
        );

        Ok(AppendReceipt {
            index: entry.index,
            prev_hash: entry.prev_hash,
            entry_hash: entry.entry_hash,
        })
    }

    /// Replay the chain from genesis.
    ///
    /// Returns the number of entries verified, or the first failure. Stored
    /// values are re-encoded with [`CanonicalBytes`] and hashed; key order and
    /// whitespace of the stored line do not matter.
    pub fn verify_integrity(&self) -> Result<u64, IntegrityFailure> {
        let store = self.store.lock();
        let records = store.read_records().map_err(|e| {
            IntegrityFailure::new(0, IntegrityFailureKind::StoreUnavailable, e.to_string())
        })?;

        let result = verify_records(&records);
        match &result {
            Ok(n) => tracing::debug!(store = %store.describe(), entries_verified = n, "audit ledger verified"),
            Err(failure) => tracing::warn!(
                store = %store.describe(),
                index = failure.index,
                reason = %failure.kind,
                detail = %failure.detail,
                "audit ledger integrity failure"
            ),
        }
        result
    }

    /// Stored records exactly as persisted, one JSON object per element.
    pub fn raw_records(&self) -> Result<Vec<String>, LedgerError> {
        self.store.lock().read_records()
    }

    /// Typed read-back of every entry.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.store
            .lock()
            .read_records()?
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                serde_json::from_str::<LedgerEntry>(raw).map_err(|e| LedgerError::Schema {
                    index: i as u64,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Number of entries in the log.
    pub fn len(&self) -> Result<u64, LedgerError> {
        Ok(self.store.lock().read_records()?.len() as u64)
    }

    /// True when the log holds no entry.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry. The next append starts again at index 0 with the
    /// zero hash.
    pub fn reset(&self) -> Result<(), LedgerError> {
        let mut store = self.store.lock();
        store.truncate()?;
        tracing::info!(store = %store.describe(), "audit ledger reset");
        Ok(())
    }

    /// Consume the ledger and return its store.
    pub fn into_store(self) -> S {
        self.store.into_inner()
    }
}

fn verify_records(records: &[String]) -> Result<u64, IntegrityFailure> {
    use IntegrityFailureKind::*;

    let mut running = ZERO_HASH.to_string();
    for (i, raw) in records.iter().enumerate() {
        let index = i as u64;
        let obj = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => obj,
            Ok(other) => {
                return Err(IntegrityFailure::new(
                    index,
                    MalformedRecord,
                    format!("record is a JSON {}", json_type_name(&other)),
                ))
            }
            Err(e) => return Err(IntegrityFailure::new(index, MalformedRecord, e.to_string())),
        };

        if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !obj.contains_key(**k)) {
            return Err(IntegrityFailure::new(index, MissingField, *missing));
        }
        let stored_prev = hash_field(&obj, "prev_hash", index)?;
        let stored_entry = hash_field(&obj, "entry_hash", index)?;

        if stored_prev != running {
            return Err(IntegrityFailure::new(
                index,
                PrevHashMismatch,
                format!("expected {running}, found {stored_prev}"),
            ));
        }

        let mut payload = Map::new();
        for key in ["index", "timestamp_utc", "action", "did"] {
            if let Some(v) = obj.get(key) {
                payload.insert(key.to_string(), v.clone());
            }
        }
        payload.insert(
            "details".to_string(),
            obj.get("details")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        );

        let computed = compute_entry_hash(&running, Value::Object(payload))
            .map_err(|e| IntegrityFailure::new(index, MalformedRecord, e.to_string()))?;
        if computed != stored_entry {
            return Err(IntegrityFailure::new(
                index,
                EntryHashMismatch,
                format!("stored {stored_entry}, recomputed {computed}"),
            ));
        }
        running = stored_entry.to_string();
    }
    Ok(records.len() as u64)
}

fn hash_field<'a>(obj: &'a Map<String, Value>, key: &str, index: u64) -> Result<&'a str, IntegrityFailure> {
    obj.get(key).and_then(Value::as_str).ok_or_else(|| {
        IntegrityFailure::new(
            index,
            IntegrityFailureKind::MissingField,
            format!("{key} is not a string"),
        )
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Two records in the established on-disk format: key-sorted, ASCII
    /// escaped, floats in shortest repr, `+00:00` offsets.
    const ESCAPED_RECORDS: [&str; 2] = [
        r#"{"action": "register", "details": {"name": "Jos\u00e9"}, "did": "did:freed:jos\u00e9", "entry_hash": "5c50d02cd8877e3ba929108fdd9123e8dc47a3afe0a4f2c5450fb4aa5316de10", "index": 0, "prev_hash": "0000000000000000000000000000000000000000000000000000000000000000", "timestamp_utc": "2026-01-15T12:00:00+00:00"}"#,
        r#"{"action": "issue_credential", "details": {"ctl": "a\tb\u007f", "emoji": "\ud83d\ude00", "ratio": 1e+16, "score": 0.5, "tiny": 1.5e-07}, "did": "did:freed:jos\u00e9", "entry_hash": "975b02c3cf4e64c6cfe505ac13075c61369c2d3efdc7b828ed67b574bf9a83fe", "index": 1, "prev_hash": "5c50d02cd8877e3ba929108fdd9123e8dc47a3afe0a4f2c5450fb4aa5316de10", "timestamp_utc": "2026-01-15T12:00:01+00:00"}"#,
    ];

    /// Memory store whose writes fail while `down` is set.
    struct FlakyStore {
        inner: MemoryStore,
        down: Arc<AtomicBool>,
    }

    impl LedgerStore for FlakyStore {
        fn read_records(&self) -> Result<Vec<String>, LedgerError> {
            self.inner.read_records()
        }

        fn append_record(&mut self, record: &str) -> Result<(), LedgerError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(LedgerError::Io(std::io::Error::other("disk full")));
            }
            self.inner.append_record(record)
        }

        fn truncate(&mut self) -> Result<(), LedgerError> {
            self.inner.truncate()
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn seeded(n: usize) -> AuditLedger<MemoryStore> {
        let ledger = AuditLedger::in_memory();
        for i in 0..n {
            ledger
                .append(
                    "register",
                    &format!("did:freed:subject-{i}"),
                    json!({ "controller": "did:freed:issuer-1", "n": i }),
                )
                .unwrap();
        }
        ledger
    }

    fn tampered(ledger: AuditLedger<MemoryStore>, index: usize, edit: impl FnOnce(&mut Map<String, Value>)) -> AuditLedger<MemoryStore> {
        let mut records = ledger.into_store().into_records();
        let mut obj: Map<String, Value> = serde_json::from_str(&records[index]).unwrap();
        edit(&mut obj);
        records[index] = serde_json::to_string(&obj).unwrap();
        AuditLedger::new(MemoryStore::from_records(records))
    }

    #[test]
    fn empty_ledger_verifies_zero() {
        let ledger = AuditLedger::in_memory();
        assert_eq!(ledger.verify_integrity().unwrap(), 0);
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn genesis_prev_hash_is_zero() {
        let ledger = AuditLedger::in_memory();
        let receipt = ledger.append("register", "did:freed:a", json!({})).unwrap();
        assert_eq!(receipt.index, 0);
        assert_eq!(receipt.prev_hash, ZERO_HASH);
        assert_eq!(receipt.entry_hash.len(), 64);
    }

    #[test]
    fn receipts_chain() {
        let ledger = AuditLedger::in_memory();
        let a = ledger.append("register", "did:freed:a", json!({})).unwrap();
        let b = ledger.append("revoke", "did:freed:a", Value::Null).unwrap();
        assert_eq!(b.index, 1);
        assert_eq!(b.prev_hash, a.entry_hash);
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn n_appends_verify_n() {
        let ledger = seeded(7);
        assert_eq!(ledger.verify_integrity().unwrap(), 7);
    }

    #[test]
    fn persisted_record_has_sorted_flat_keys() {
        let ledger = AuditLedger::in_memory();
        ledger
            .append_at("register", "did:freed:a", json!({"z": 1, "a": 2}), ts("2026-01-15T12:00:00Z"))
            .unwrap();
        let records = ledger.into_store().into_records();
        let line = &records[0];
        assert!(line.starts_with(r#"{"action":"register","details":{"a":2,"z":1},"did":"did:freed:a","entry_hash":""#));
        assert!(line.contains(r#""timestamp_utc":"2026-01-15T12:00:00Z""#));
    }

    #[test]
    fn details_edit_detected_at_that_index() {
        let ledger = tampered(seeded(4), 2, |obj| {
            obj.insert("details".into(), json!({"controller": "did:freed:mallory"}));
        });
        let failure = ledger.verify_integrity().unwrap_err();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.kind, IntegrityFailureKind::EntryHashMismatch);
        assert_eq!(failure.to_string(), "entry_hash_mismatch_at_index=2");
    }

    #[test]
    fn rehashed_edit_breaks_next_link() {
        let ledger = tampered(seeded(4), 1, |obj| {
            obj.insert("action".into(), json!("update"));
            let prev = obj["prev_hash"].as_str().unwrap().to_string();
            let mut payload = obj.clone();
            payload.remove("prev_hash");
            payload.remove("entry_hash");
            let rehashed = compute_entry_hash(&prev, Value::Object(payload)).unwrap();
            obj.insert("entry_hash".into(), json!(rehashed));
        });
        let failure = ledger.verify_integrity().unwrap_err();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.kind, IntegrityFailureKind::PrevHashMismatch);
    }

    #[test]
    fn missing_field_reported() {
        let ledger = tampered(seeded(2), 0, |obj| {
            obj.remove("action");
        });
        let failure = ledger.verify_integrity().unwrap_err();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.kind, IntegrityFailureKind::MissingField);
        assert_eq!(failure.detail, "action");
    }

    #[test]
    fn non_object_record_is_malformed() {
        let mut records = seeded(2).into_store().into_records();
        records.push("[1,2,3]".to_string());
        let ledger = AuditLedger::new(MemoryStore::from_records(records));
        let failure = ledger.verify_integrity().unwrap_err();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.kind, IntegrityFailureKind::MalformedRecord);
    }

    #[test]
    fn non_object_details_rejected_on_append() {
        let ledger = AuditLedger::in_memory();
        let err = ledger.append("register", "did:freed:a", json!([1])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDetails { found: "array" }));
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn reset_restarts_chain() {
        let ledger = seeded(3);
        ledger.reset().unwrap();
        assert_eq!(ledger.len().unwrap(), 0);
        let receipt = ledger.append("register", "did:freed:a", json!({})).unwrap();
        assert_eq!(receipt.index, 0);
        assert_eq!(receipt.prev_hash, ZERO_HASH);
    }

    #[test]
    fn entries_read_back_typed() {
        let ledger = seeded(3);
        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].subject_id, "did:freed:subject-1");
        for entry in &entries {
            assert_eq!(entry.recompute_hash().unwrap(), entry.entry_hash);
        }
    }

    #[test]
    fn reopen_continues_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::at(dir.path().join("audit.jsonl"));
        let first = AuditLedger::open(&config).unwrap();
        let a = first.append("register", "did:freed:a", json!({})).unwrap();
        drop(first);

        let second = AuditLedger::open(&config).unwrap();
        let b = second.append("update", "did:freed:a", json!({})).unwrap();
        assert_eq!(b.index, 1);
        assert_eq!(b.prev_hash, a.entry_hash);
        assert_eq!(second.verify_integrity().unwrap(), 2);
    }

    #[test]
    fn file_tamper_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let ledger = AuditLedger::open(&LedgerConfig::at(&path)).unwrap();
        for i in 0..3 {
            ledger.append("register", &format!("did:freed:s-{i}"), json!({"i": i})).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replacen("\"i\":1", "\"i\":9", 1)).unwrap();
        let failure = ledger.verify_integrity().unwrap_err();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, IntegrityFailureKind::EntryHashMismatch);
    }

    #[test]
    fn concurrent_appends_keep_chain_linear() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        ledger
                            .append("update", &format!("did:freed:t{t}"), json!({ "i": i }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ledger.verify_integrity().unwrap(), 200);
        let indices: Vec<u64> = ledger.entries().unwrap().iter().map(|e| e.index).collect();
        assert_eq!(indices, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn two_handles_on_one_file_extend_one_chain() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::at(dir.path().join("audit.jsonl"));
        let a = AuditLedger::open(&config).unwrap();
        let b = AuditLedger::open(&config).unwrap();

        let r0 = a.append("register", "did:freed:a", json!({})).unwrap();
        let r1 = b.append("update", "did:freed:a", json!({})).unwrap();
        let r2 = a.append("revoke", "did:freed:a", json!({})).unwrap();

        assert_eq!([r0.index, r1.index, r2.index], [0, 1, 2]);
        assert_eq!(r1.prev_hash, r0.entry_hash);
        assert_eq!(r2.prev_hash, r1.entry_hash);
        assert_eq!(a.len().unwrap(), 3);
        assert_eq!(a.verify_integrity().unwrap(), 3);
        assert_eq!(b.verify_integrity().unwrap(), 3);
    }

    #[test]
    fn handles_in_many_threads_share_the_file_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::at(dir.path().join("audit.jsonl"));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let config = config.clone();
                std::thread::spawn(move || {
                    let ledger = AuditLedger::open(&config).unwrap();
                    for i in 0..10 {
                        ledger
                            .append("update", &format!("did:freed:t{t}"), json!({ "i": i }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let ledger = AuditLedger::open(&config).unwrap();
        assert_eq!(ledger.verify_integrity().unwrap(), 40);
        let indices: Vec<u64> = ledger.entries().unwrap().iter().map(|e| e.index).collect();
        assert_eq!(indices, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn failed_write_does_not_advance_tip() {
        let down = Arc::new(AtomicBool::new(false));
        let ledger = AuditLedger::new(FlakyStore {
            inner: MemoryStore::new(),
            down: Arc::clone(&down),
        });
        ledger.append("register", "did:freed:a", json!({})).unwrap();
        let last_good = ledger.append("update", "did:freed:a", json!({})).unwrap();

        down.store(true, Ordering::SeqCst);
        let err = ledger.append("revoke", "did:freed:a", json!({})).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
        assert_eq!(ledger.len().unwrap(), 2);

        down.store(false, Ordering::SeqCst);
        let next = ledger.append("revoke", "did:freed:a", json!({})).unwrap();
        assert_eq!(next.index, 2);
        assert_eq!(next.prev_hash, last_good.entry_hash);
        assert_eq!(ledger.verify_integrity().unwrap(), 3);
    }

    #[test]
    fn escaped_records_verify_and_extend() {
        let records = ESCAPED_RECORDS.iter().map(|r| r.to_string()).collect();
        let ledger = AuditLedger::new(MemoryStore::from_records(records));
        assert_eq!(ledger.verify_integrity().unwrap(), 2);

        let entries = ledger.entries().unwrap();
        assert_eq!(entries[0].details["name"], "Jos\u{e9}");
        assert_eq!(entries[1].details["emoji"], "\u{1F600}");
        assert_eq!(entries[1].details["ratio"], json!(1e16));

        let next = ledger
            .append("revoke", "did:freed:jos\u{e9}", json!({"score": 0.25}))
            .unwrap();
        assert_eq!(next.index, 2);
        assert_eq!(next.prev_hash, "975b02c3cf4e64c6cfe505ac13075c61369c2d3efdc7b828ed67b574bf9a83fe");
        assert_eq!(ledger.verify_integrity().unwrap(), 3);
    }

    #[test]
    fn non_ascii_and_float_details_hash_like_existing_writers() {
        let ledger = AuditLedger::in_memory();
        let receipt = ledger
            .append_at(
                "register",
                "did:freed:jos\u{e9}",
                json!({"name": "Jos\u{e9}", "score": 0.5}),
                ts("2026-01-15T12:00:00Z"),
            )
            .unwrap();
        assert_eq!(
            receipt.entry_hash,
            "8460d17471cd6406cdf4f44a8e0b9443e03ea059150d9fe13fc5cfb20ca67023"
        );
        let line = &ledger.raw_records().unwrap()[0];
        assert!(line.contains(r#""details":{"name":"Jos\u00e9","score":0.5}"#));
        assert!(line.is_ascii());
    }

    #[test]
    fn integrity_failure_maps_to_freed_error() {
        let failure = IntegrityFailure::new(3, IntegrityFailureKind::PrevHashMismatch, "x");
        assert_eq!(
            FreedError::from(failure).category(),
            freed_core::ErrorCategory::Integrity
        );
    }
}
