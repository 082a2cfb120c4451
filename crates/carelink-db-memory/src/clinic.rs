//! `ClinicStorage` implementation.

use async_trait::async_trait;
use carelink_core::{PrincipalId, RecordId};
use carelink_storage::{
    ClinicStorage, Doctor, DoctorChanges, Mapping, MappingTarget, NewDoctor, NewPatient, Patient,
    PatientChanges, StorageError, StorageResult, constraints,
};
use time::OffsetDateTime;

use crate::storage::{InMemoryStorage, newest_first};

#[async_trait]
impl ClinicStorage for InMemoryStorage {
    // ==================== Patients ====================

    async fn insert_patient(
        &self,
        patient: NewPatient,
        at: OffsetDateTime,
    ) -> StorageResult<Patient> {
        let mut tables = self.tables.write().await;
        if !tables.principals.contains_key(&patient.owner_id) {
            return Err(StorageError::foreign_key_violation(
                constraints::PATIENT_OWNER_FK,
            ));
        }

        let id = tables.next_patient_id();
        let row = Patient {
            id,
            owner_id: patient.owner_id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            address: patient.address,
            created_at: at,
            updated_at: at,
        };
        tables.patients.insert(id, row.clone());
        Ok(row)
    }

    async fn list_patients(&self, owner: PrincipalId) -> StorageResult<Vec<Patient>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| p.owner_id == owner)
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn find_patient(
        &self,
        owner: PrincipalId,
        id: RecordId,
    ) -> StorageResult<Option<Patient>> {
        let tables = self.tables.read().await;
        Ok(tables.owned_patient(owner, id).cloned())
    }

    async fn update_patient(
        &self,
        owner: PrincipalId,
        id: RecordId,
        changes: PatientChanges,
        at: OffsetDateTime,
    ) -> StorageResult<Option<Patient>> {
        let mut tables = self.tables.write().await;
        let Some(patient) = tables
            .patients
            .get_mut(&id)
            .filter(|p| p.owner_id == owner)
        else {
            return Ok(None);
        };
        changes.apply(patient, at);
        Ok(Some(patient.clone()))
    }

    async fn delete_patient(&self, owner: PrincipalId, id: RecordId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.owned_patient(owner, id).is_none() {
            return Ok(false);
        }
        if tables.is_referenced(MappingTarget::Patient(id)) {
            return Err(StorageError::foreign_key_violation(
                constraints::MAPPING_PATIENT_FK,
            ));
        }
        Ok(tables.patients.remove(&id).is_some())
    }

    // ==================== Doctors ====================

    async fn insert_doctor(&self, doctor: NewDoctor, at: OffsetDateTime) -> StorageResult<Doctor> {
        let mut tables = self.tables.write().await;
        let id = tables.next_doctor_id();
        let row = Doctor {
            id,
            name: doctor.name,
            specialization: doctor.specialization,
            created_at: at,
            updated_at: at,
        };
        tables.doctors.insert(id, row.clone());
        Ok(row)
    }

    async fn list_doctors(&self) -> StorageResult<Vec<Doctor>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Doctor> = tables.doctors.values().cloned().collect();
        newest_first(&mut rows, |d| (d.created_at, d.id));
        Ok(rows)
    }

    async fn find_doctor(&self, id: RecordId) -> StorageResult<Option<Doctor>> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.get(&id).cloned())
    }

    async fn update_doctor(
        &self,
        id: RecordId,
        changes: DoctorChanges,
        at: OffsetDateTime,
    ) -> StorageResult<Option<Doctor>> {
        let mut tables = self.tables.write().await;
        let Some(doctor) = tables.doctors.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(doctor, at);
        Ok(Some(doctor.clone()))
    }

    async fn delete_doctor(&self, id: RecordId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.doctors.contains_key(&id) {
            return Ok(false);
        }
        if tables.is_referenced(MappingTarget::Doctor(id)) {
            return Err(StorageError::foreign_key_violation(
                constraints::MAPPING_DOCTOR_FK,
            ));
        }
        Ok(tables.doctors.remove(&id).is_some())
    }

    // ==================== Mappings ====================

    async fn insert_mapping(
        &self,
        patient_id: RecordId,
        doctor_id: RecordId,
        at: OffsetDateTime,
    ) -> StorageResult<Mapping> {
        let mut tables = self.tables.write().await;
        if !tables.patients.contains_key(&patient_id) {
            return Err(StorageError::foreign_key_violation(
                constraints::MAPPING_PATIENT_FK,
            ));
        }
        if !tables.doctors.contains_key(&doctor_id) {
            return Err(StorageError::foreign_key_violation(
                constraints::MAPPING_DOCTOR_FK,
            ));
        }
        if tables
            .mappings
            .values()
            .any(|m| m.patient_id == patient_id && m.doctor_id == doctor_id)
        {
            return Err(StorageError::unique_violation(
                constraints::UNIQ_PATIENT_DOCTOR,
            ));
        }

        let id = tables.next_mapping_id();
        let row = Mapping {
            id,
            patient_id,
            doctor_id,
            created_at: at,
            updated_at: at,
        };
        tables.mappings.insert(id, row.clone());
        Ok(row)
    }

    async fn mapping_exists(
        &self,
        patient_id: RecordId,
        doctor_id: RecordId,
    ) -> StorageResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .mappings
            .values()
            .any(|m| m.patient_id == patient_id && m.doctor_id == doctor_id))
    }

    async fn list_mappings(&self, owner: PrincipalId) -> StorageResult<Vec<Mapping>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Mapping> = tables
            .mappings
            .values()
            .filter(|m| tables.owned_patient(owner, m.patient_id).is_some())
            .cloned()
            .collect();
        newest_first(&mut rows, |m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn find_mapping(
        &self,
        owner: PrincipalId,
        id: RecordId,
    ) -> StorageResult<Option<Mapping>> {
        let tables = self.tables.read().await;
        Ok(tables.owned_mapping(owner, id).cloned())
    }

    async fn delete_mapping(&self, owner: PrincipalId, id: RecordId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.owned_mapping(owner, id).is_none() {
            return Ok(false);
        }
        Ok(tables.mappings.remove(&id).is_some())
    }

    async fn list_doctors_for_patient(&self, patient_id: RecordId) -> StorageResult<Vec<Doctor>> {
        let tables = self.tables.read().await;
        let mut mappings: Vec<&Mapping> = tables
            .mappings
            .values()
            .filter(|m| m.patient_id == patient_id)
            .collect();
        newest_first(&mut mappings, |m| (m.created_at, m.id));
        Ok(mappings
            .into_iter()
            .filter_map(|m| tables.doctors.get(&m.doctor_id).cloned())
            .collect())
    }

    async fn has_mappings(&self, target: MappingTarget) -> StorageResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.is_referenced(target))
    }

    // ==================== Backend ====================

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use carelink_auth::{CredentialStore, NewPrincipal};
    use carelink_storage::Gender;
    use time::macros::datetime;

    use super::*;

    const T0: OffsetDateTime = datetime!(2024-05-01 10:00:00 UTC);

    async fn with_owner() -> (InMemoryStorage, PrincipalId) {
        let storage = InMemoryStorage::new();
        let owner = storage
            .save(NewPrincipal::active("a@x.com", "Alice", "hash".into()), T0)
            .await
            .unwrap()
            .id;
        (storage, owner)
    }

    fn john(owner: PrincipalId) -> NewPatient {
        NewPatient {
            owner_id: owner,
            name: "John".into(),
            age: 45,
            gender: Gender::Male,
            address: String::new(),
        }
    }

    fn lee() -> NewDoctor {
        NewDoctor {
            name: "Dr. Lee".into(),
            specialization: "Cardiology".into(),
        }
    }

    #[tokio::test]
    async fn test_patient_requires_existing_owner() {
        let storage = InMemoryStorage::new();
        let err = storage.insert_patient(john(99), T0).await.unwrap_err();
        assert_eq!(err.constraint(), Some(constraints::PATIENT_OWNER_FK));
    }

    #[tokio::test]
    async fn test_patient_scoped_to_owner() {
        let (storage, owner) = with_owner().await;
        let patient = storage.insert_patient(john(owner), T0).await.unwrap();

        assert!(storage.find_patient(owner, patient.id).await.unwrap().is_some());
        assert!(storage.find_patient(owner + 1, patient.id).await.unwrap().is_none());
        assert!(storage.list_patients(owner + 1).await.unwrap().is_empty());
        assert!(!storage.delete_patient(owner + 1, patient.id).await.unwrap());
        assert!(
            storage
                .update_patient(owner + 1, patient.id, PatientChanges::default(), T0)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (storage, owner) = with_owner().await;
        let first = storage.insert_patient(john(owner), T0).await.unwrap();
        let second = storage
            .insert_patient(john(owner), T0 + time::Duration::seconds(1))
            .await
            .unwrap();
        let same_instant = storage
            .insert_patient(john(owner), T0 + time::Duration::seconds(1))
            .await
            .unwrap();

        let ids: Vec<_> = storage
            .list_patients(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![same_instant.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_mapping_constraints() {
        let (storage, owner) = with_owner().await;
        let patient = storage.insert_patient(john(owner), T0).await.unwrap();
        let doctor = storage.insert_doctor(lee(), T0).await.unwrap();

        storage
            .insert_mapping(patient.id, doctor.id, T0)
            .await
            .unwrap();
        let dup = storage
            .insert_mapping(patient.id, doctor.id, T0)
            .await
            .unwrap_err();
        assert_eq!(dup.constraint(), Some(constraints::UNIQ_PATIENT_DOCTOR));

        let missing = storage.insert_mapping(patient.id, 999, T0).await.unwrap_err();
        assert_eq!(missing.constraint(), Some(constraints::MAPPING_DOCTOR_FK));
        let missing = storage.insert_mapping(999, doctor.id, T0).await.unwrap_err();
        assert_eq!(missing.constraint(), Some(constraints::MAPPING_PATIENT_FK));
    }

    #[tokio::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let (storage, owner) = with_owner().await;
        let patient = storage.insert_patient(john(owner), T0).await.unwrap();
        let doctor = storage.insert_doctor(lee(), T0).await.unwrap();
        let mapping = storage
            .insert_mapping(patient.id, doctor.id, T0)
            .await
            .unwrap();

        assert!(storage.has_mappings(MappingTarget::Doctor(doctor.id)).await.unwrap());
        let err = storage.delete_doctor(doctor.id).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
        let err = storage.delete_patient(owner, patient.id).await.unwrap_err();
        assert!(err.is_foreign_key_violation());

        assert!(storage.delete_mapping(owner, mapping.id).await.unwrap());
        assert!(storage.delete_doctor(doctor.id).await.unwrap());
        assert!(storage.delete_patient(owner, patient.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mappings_scoped_to_patient_owner() {
        let (storage, owner) = with_owner().await;
        let patient = storage.insert_patient(john(owner), T0).await.unwrap();
        let doctor = storage.insert_doctor(lee(), T0).await.unwrap();
        let mapping = storage
            .insert_mapping(patient.id, doctor.id, T0)
            .await
            .unwrap();

        assert_eq!(storage.list_mappings(owner).await.unwrap().len(), 1);
        assert!(storage.list_mappings(owner + 1).await.unwrap().is_empty());
        assert!(storage.find_mapping(owner + 1, mapping.id).await.unwrap().is_none());
        assert!(!storage.delete_mapping(owner + 1, mapping.id).await.unwrap());

        let doctors = storage.list_doctors_for_patient(patient.id).await.unwrap();
        assert_eq!(doctors, vec![doctor]);
    }
}
