use carelink_core::{PrincipalId, RecordId, SharedClock};
use carelink_storage::{DynClinicStorage, MappingTarget, Patient};

use crate::input::{PatientInput, UpdateMode};
use crate::integrity::DeletionGuard;
use crate::{RecordsError, RecordsResult};

const ENTITY: &str = "patient";

/// Patients, visible and mutable only by their owner.
#[derive(Clone)]
pub struct PatientService {
    storage: DynClinicStorage,
    clock: SharedClock,
    guard: DeletionGuard,
}

impl PatientService {
    #[must_use]
    pub fn new(storage: DynClinicStorage, clock: SharedClock, guard: DeletionGuard) -> Self {
        Self {
            storage,
            clock,
            guard,
        }
    }

    /// Lists the principal's patients, newest first.
    pub async fn list(&self, principal: PrincipalId) -> RecordsResult<Vec<Patient>> {
        Ok(self.storage.list_patients(principal).await?)
    }

    /// Reads one of the principal's patients.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::NotFound` both when the patient does not exist
    /// and when another principal owns it.
    pub async fn get(&self, principal: PrincipalId, id: RecordId) -> RecordsResult<Patient> {
        self.storage
            .find_patient(principal, id)
            .await?
            .ok_or_else(|| RecordsError::not_found(ENTITY, id))
    }

    /// Creates a patient owned by `principal`, whatever owner the input names.
    pub async fn create(
        &self,
        principal: PrincipalId,
        input: PatientInput,
    ) -> RecordsResult<Patient> {
        let new = input.into_new(principal)?;
        let patient = self.storage.insert_patient(new, self.clock.now()).await?;
        tracing::info!(principal_id = principal, patient_id = patient.id, "patient created");
        Ok(patient)
    }

    /// Updates one of the principal's patients.
    ///
    /// Visibility is checked before the input is validated.
    pub async fn update(
        &self,
        principal: PrincipalId,
        id: RecordId,
        input: PatientInput,
        mode: UpdateMode,
    ) -> RecordsResult<Patient> {
        self.get(principal, id).await?;
        let changes = input.into_changes(mode)?;
        self.storage
            .update_patient(principal, id, changes, self.clock.now())
            .await?
            .ok_or_else(|| RecordsError::not_found(ENTITY, id))
    }

    /// Deletes one of the principal's patients.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Referenced` while any mapping references it.
    pub async fn delete(&self, principal: PrincipalId, id: RecordId) -> RecordsResult<()> {
        self.get(principal, id).await?;

        let target = MappingTarget::Patient(id);
        self.guard.ensure_deletable(target).await?;

        let deleted = self
            .storage
            .delete_patient(principal, id)
            .await
            .map_err(|e| DeletionGuard::translate(target, e))?;
        if !deleted {
            return Err(RecordsError::not_found(ENTITY, id));
        }
        tracing::info!(principal_id = principal, patient_id = id, "patient deleted");
        Ok(())
    }
}
