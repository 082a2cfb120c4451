use std::collections::BTreeMap;
use std::sync::Arc;

use carelink_auth::Principal;
use carelink_core::{PrincipalId, RecordId};
use carelink_storage::{Doctor, Mapping, MappingTarget, Patient};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory storage for principals, patients, doctors and mappings.
///
/// Rows live in ordered maps keyed by id; ids are assigned from per-table
/// counters and never reused.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    pub(crate) tables: RwLock<Tables>,
}

impl InMemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage behind an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub principals: BTreeMap<PrincipalId, Principal>,
    pub patients: BTreeMap<RecordId, Patient>,
    pub doctors: BTreeMap<RecordId, Doctor>,
    pub mappings: BTreeMap<RecordId, Mapping>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    principal: i64,
    patient: i64,
    doctor: i64,
    mapping: i64,
}

impl Tables {
    pub fn next_principal_id(&mut self) -> PrincipalId {
        self.sequences.principal += 1;
        self.sequences.principal
    }

    pub fn next_patient_id(&mut self) -> RecordId {
        self.sequences.patient += 1;
        self.sequences.patient
    }

    pub fn next_doctor_id(&mut self) -> RecordId {
        self.sequences.doctor += 1;
        self.sequences.doctor
    }

    pub fn next_mapping_id(&mut self) -> RecordId {
        self.sequences.mapping += 1;
        self.sequences.mapping
    }

    /// Returns the patient if it exists and belongs to `owner`.
    pub fn owned_patient(&self, owner: PrincipalId, id: RecordId) -> Option<&Patient> {
        self.patients.get(&id).filter(|p| p.owner_id == owner)
    }

    /// Returns the mapping if its patient belongs to `owner`.
    pub fn owned_mapping(&self, owner: PrincipalId, id: RecordId) -> Option<&Mapping> {
        self.mappings
            .get(&id)
            .filter(|m| self.owned_patient(owner, m.patient_id).is_some())
    }

    pub fn is_referenced(&self, target: MappingTarget) -> bool {
        self.mappings.values().any(|m| target.is_referenced_by(m))
    }
}

/// Sorts rows newest first: `created_at` desc, then `id` desc.
pub(crate) fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (OffsetDateTime, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}
