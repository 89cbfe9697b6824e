//! # Case Book
//!
//! Thread-safe store of dispute cases. Each case sits behind its own mutex so
//! transitions on different cases proceed in parallel, while two transitions
//! on the same case are serialized: the second sees the first's event and
//! proof id, so a replayed proof cannot race past the replay check.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use freed_core::Timestamp;

use crate::case::{open_case_at, DisputeCase, DisputeEvent, TransitionOptions};
use crate::error::DisputeError;
use crate::integrity::{verify_case_history_integrity, IntegrityReport};
use crate::status::DisputeStatus;

type CaseSlot = Arc<Mutex<DisputeCase>>;

/// Cloneable handle to a shared set of cases keyed by case id.
#[derive(Debug, Clone, Default)]
pub struct CaseBook {
    cases: Arc<RwLock<HashMap<String, CaseSlot>>>,
}

impl CaseBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new case now. Fails if the id is taken.
    pub fn open(
        &self,
        case_id: &str,
        subject_id: &str,
        credential_id: &str,
        opened_by: &str,
        reason: &str,
        evidence_refs: Vec<String>,
    ) -> Result<DisputeCase, DisputeError> {
        let case = open_case_at(
            case_id,
            subject_id,
            credential_id,
            opened_by,
            reason,
            evidence_refs,
            Timestamp::now(),
        );
        self.insert(case.clone())?;
        Ok(case)
    }

    /// Add an existing case, e.g. one loaded from storage.
    pub fn insert(&self, case: DisputeCase) -> Result<(), DisputeError> {
        let mut cases = self.cases.write();
        if cases.contains_key(&case.case_id) {
            return Err(DisputeError::DuplicateCase(case.case_id));
        }
        cases.insert(case.case_id.clone(), Arc::new(Mutex::new(case)));
        Ok(())
    }

    /// Snapshot of a case.
    pub fn get(&self, case_id: &str) -> Option<DisputeCase> {
        self.slot(case_id).map(|slot| slot.lock().clone())
    }

    /// Apply a transition to a stored case under its lock.
    pub fn transition(
        &self,
        case_id: &str,
        to_status: DisputeStatus,
        actor: &str,
        note: &str,
        options: TransitionOptions<'_>,
    ) -> Result<DisputeEvent, DisputeError> {
        let slot = self
            .slot(case_id)
            .ok_or_else(|| DisputeError::UnknownCase(case_id.to_string()))?;
        let mut case = slot.lock();
        case.transition(to_status, actor, note, options).cloned()
    }

    /// Run the history integrity check on a stored case.
    pub fn verify(&self, case_id: &str) -> Result<IntegrityReport, DisputeError> {
        let slot = self
            .slot(case_id)
            .ok_or_else(|| DisputeError::UnknownCase(case_id.to_string()))?;
        let case = slot.lock();
        Ok(verify_case_history_integrity(&case))
    }

    /// Case ids in sorted order.
    pub fn case_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cases.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of open or closed cases held.
    pub fn len(&self) -> usize {
        self.cases.read().len()
    }

    /// True when the book holds no case.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, case_id: &str) -> Option<CaseSlot> {
        self.cases.read().get(case_id).cloned()
    }
}
