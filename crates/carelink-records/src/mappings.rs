use carelink_core::{PrincipalId, RecordId, SharedClock};
use carelink_storage::{Doctor, DynClinicStorage, Mapping, StorageError, constraints};

use crate::input::MappingInput;
use crate::{RecordsError, RecordsResult};

/// Patient/doctor assignments.
///
/// A mapping is visible to, and managed by, the owner of its patient.
#[derive(Clone)]
pub struct MappingService {
    storage: DynClinicStorage,
    clock: SharedClock,
}

impl MappingService {
    #[must_use]
    pub fn new(storage: DynClinicStorage, clock: SharedClock) -> Self {
        Self { storage, clock }
    }

    /// Assigns a doctor to one of the principal's patients.
    ///
    /// Preconditions, first failure wins:
    /// 1. the patient exists and is owned by `principal` (`NotFound`)
    /// 2. the doctor exists (`NotFound`)
    /// 3. the pair is not already mapped (`AlreadyAssigned`)
    ///
    /// The pre-checks only produce friendly errors. The unique constraint on
    /// the pair decides concurrent creations: exactly one insert wins.
    pub async fn create(
        &self,
        principal: PrincipalId,
        input: MappingInput,
    ) -> RecordsResult<Mapping> {
        let (patient_id, doctor_id) = input.into_pair()?;

        if self.storage.find_patient(principal, patient_id).await?.is_none() {
            return Err(RecordsError::not_found("patient", patient_id));
        }
        if self.storage.find_doctor(doctor_id).await?.is_none() {
            return Err(RecordsError::not_found("doctor", doctor_id));
        }
        if self.storage.mapping_exists(patient_id, doctor_id).await? {
            return Err(RecordsError::AlreadyAssigned {
                patient_id,
                doctor_id,
            });
        }

        let mapping = self
            .storage
            .insert_mapping(patient_id, doctor_id, self.clock.now())
            .await
            .map_err(|e| translate_insert(patient_id, doctor_id, e))?;

        tracing::info!(
            principal_id = principal,
            mapping_id = mapping.id,
            patient_id,
            doctor_id,
            "doctor assigned to patient"
        );
        Ok(mapping)
    }

    /// Lists mappings of the principal's patients, newest first.
    pub async fn list(&self, principal: PrincipalId) -> RecordsResult<Vec<Mapping>> {
        Ok(self.storage.list_mappings(principal).await?)
    }

    /// Lists the doctors assigned to one of the principal's patients.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::NotFound` if the patient is missing or not owned.
    pub async fn doctors_for_patient(
        &self,
        principal: PrincipalId,
        patient_id: RecordId,
    ) -> RecordsResult<Vec<Doctor>> {
        if self.storage.find_patient(principal, patient_id).await?.is_none() {
            return Err(RecordsError::not_found("patient", patient_id));
        }
        Ok(self.storage.list_doctors_for_patient(patient_id).await?)
    }

    /// Removes a mapping of one of the principal's patients and returns it.
    /// The patient and doctor are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::NotFound` if the mapping is missing, belongs to
    /// another principal's patient, or was removed concurrently.
    pub async fn delete(
        &self,
        principal: PrincipalId,
        mapping_id: RecordId,
    ) -> RecordsResult<Mapping> {
        let Some(mapping) = self.storage.find_mapping(principal, mapping_id).await? else {
            return Err(RecordsError::not_found("mapping", mapping_id));
        };
        if !self.storage.delete_mapping(principal, mapping_id).await? {
            return Err(RecordsError::not_found("mapping", mapping_id));
        }
        tracing::info!(
            principal_id = principal,
            mapping_id,
            patient_id = mapping.patient_id,
            doctor_id = mapping.doctor_id,
            "mapping deleted"
        );
        Ok(mapping)
    }
}

/// Maps an insert rejected by the store. A concurrent creator of the same
/// pair surfaces as `AlreadyAssigned`; a side deleted in between as `NotFound`.
fn translate_insert(patient_id: RecordId, doctor_id: RecordId, err: StorageError) -> RecordsError {
    match err.constraint() {
        Some(constraints::UNIQ_PATIENT_DOCTOR) => RecordsError::AlreadyAssigned {
            patient_id,
            doctor_id,
        },
        Some(constraints::MAPPING_PATIENT_FK) => RecordsError::not_found("patient", patient_id),
        Some(constraints::MAPPING_DOCTOR_FK) => RecordsError::not_found("doctor", doctor_id),
        _ => RecordsError::Storage(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_insert() {
        assert!(matches!(
            translate_insert(
                1,
                2,
                StorageError::unique_violation(constraints::UNIQ_PATIENT_DOCTOR)
            ),
            RecordsError::AlreadyAssigned {
                patient_id: 1,
                doctor_id: 2
            }
        ));
        assert!(matches!(
            translate_insert(
                1,
                2,
                StorageError::foreign_key_violation(constraints::MAPPING_DOCTOR_FK)
            ),
            RecordsError::NotFound {
                entity: "doctor",
                id: 2
            }
        ));
        assert!(matches!(
            translate_insert(1, 2, StorageError::internal("boom")),
            RecordsError::Storage(_)
        ));
    }
}
