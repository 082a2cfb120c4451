//! The relational store contract.

use async_trait::async_trait;
use carelink_core::{PrincipalId, RecordId};
use time::OffsetDateTime;

use crate::StorageResult;
use crate::types::{
    Doctor, DoctorChanges, Mapping, MappingTarget, NewDoctor, NewPatient, Patient, PatientChanges,
};

/// Transactional storage for patients, doctors and mappings.
///
/// Every patient and mapping query that takes an `owner` filters on it at the
/// data-access boundary: a record owned by someone else behaves exactly like a
/// missing one. Lists are ordered newest first (`created_at` desc, `id` desc).
///
/// Implementations must be thread-safe (`Send + Sync`) and must enforce the
/// constraints in [`crate::constraints`] atomically with the writes they guard.
///
/// # Example
///
/// ```ignore
/// use carelink_storage::{ClinicStorage, StorageError};
///
/// async fn owned(storage: &dyn ClinicStorage, owner: i64, id: i64) -> Result<Patient, StorageError> {
///     storage
///         .find_patient(owner, id)
///         .await?
///         .ok_or_else(|| StorageError::not_found("patient", id))
/// }
/// ```
#[async_trait]
pub trait ClinicStorage: Send + Sync {
    // ==================== Patients ====================

    /// Inserts a patient stamped with `at` for both timestamps.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ForeignKeyViolation` if the owner does not exist.
    async fn insert_patient(&self, patient: NewPatient, at: OffsetDateTime)
    -> StorageResult<Patient>;

    /// Lists the patients owned by `owner`.
    async fn list_patients(&self, owner: PrincipalId) -> StorageResult<Vec<Patient>>;

    /// Reads a patient visible to `owner`.
    ///
    /// Returns `None` if it does not exist or belongs to another principal.
    async fn find_patient(
        &self,
        owner: PrincipalId,
        id: RecordId,
    ) -> StorageResult<Option<Patient>>;

    /// Applies `changes` to a patient visible to `owner`.
    ///
    /// Returns `None` if no such patient is visible.
    async fn update_patient(
        &self,
        owner: PrincipalId,
        id: RecordId,
        changes: PatientChanges,
        at: OffsetDateTime,
    ) -> StorageResult<Option<Patient>>;

    /// Deletes a patient visible to `owner`. Returns `false` if none was visible.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ForeignKeyViolation` if a mapping references it.
    async fn delete_patient(&self, owner: PrincipalId, id: RecordId) -> StorageResult<bool>;

    // ==================== Doctors ====================

    /// Inserts a doctor stamped with `at` for both timestamps.
    async fn insert_doctor(&self, doctor: NewDoctor, at: OffsetDateTime) -> StorageResult<Doctor>;

    /// Lists every doctor.
    async fn list_doctors(&self) -> StorageResult<Vec<Doctor>>;

    /// Reads a doctor by id.
    async fn find_doctor(&self, id: RecordId) -> StorageResult<Option<Doctor>>;

    /// Applies `changes` to a doctor. Returns `None` if it does not exist.
    async fn update_doctor(
        &self,
        id: RecordId,
        changes: DoctorChanges,
        at: OffsetDateTime,
    ) -> StorageResult<Option<Doctor>>;

    /// Deletes a doctor. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ForeignKeyViolation` if a mapping references it.
    async fn delete_doctor(&self, id: RecordId) -> StorageResult<bool>;

    // ==================== Mappings ====================

    /// Inserts a mapping between a patient and a doctor.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UniqueViolation` if the pair is already mapped and
    /// `StorageError::ForeignKeyViolation` if either side does not exist.
    async fn insert_mapping(
        &self,
        patient_id: RecordId,
        doctor_id: RecordId,
        at: OffsetDateTime,
    ) -> StorageResult<Mapping>;

    /// Returns `true` if the pair is already mapped.
    async fn mapping_exists(&self, patient_id: RecordId, doctor_id: RecordId)
    -> StorageResult<bool>;

    /// Lists mappings whose patient is owned by `owner`.
    async fn list_mappings(&self, owner: PrincipalId) -> StorageResult<Vec<Mapping>>;

    /// Reads a mapping whose patient is owned by `owner`.
    async fn find_mapping(
        &self,
        owner: PrincipalId,
        id: RecordId,
    ) -> StorageResult<Option<Mapping>>;

    /// Deletes a mapping whose patient is owned by `owner`.
    /// Returns `false` if none was visible.
    async fn delete_mapping(&self, owner: PrincipalId, id: RecordId) -> StorageResult<bool>;

    /// Lists the doctors mapped to a patient, most recently assigned first.
    ///
    /// Performs no ownership check; callers resolve the patient first.
    async fn list_doctors_for_patient(&self, patient_id: RecordId) -> StorageResult<Vec<Doctor>>;

    /// Returns `true` if any mapping references `target`.
    async fn has_mappings(&self, target: MappingTarget) -> StorageResult<bool>;

    // ==================== Backend ====================

    /// Checks that the backend is reachable.
    async fn ping(&self) -> StorageResult<()>;

    /// Returns a short name for the backend, e.g. `"memory"`.
    fn backend_name(&self) -> &'static str;
}
