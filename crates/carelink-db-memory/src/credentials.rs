//! `CredentialStore` implementation.

use async_trait::async_trait;
use carelink_auth::{CredentialStore, NewPrincipal, Principal};
use carelink_core::PrincipalId;
use carelink_storage::{StorageError, StorageResult, constraints};
use time::OffsetDateTime;

use crate::storage::InMemoryStorage;

#[async_trait]
impl CredentialStore for InMemoryStorage {
    async fn find_by_login_id(&self, login_id: &str) -> StorageResult<Option<Principal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .principals
            .values()
            .find(|p| p.login_id == login_id)
            .cloned())
    }

    async fn find_by_id(&self, id: PrincipalId) -> StorageResult<Option<Principal>> {
        let tables = self.tables.read().await;
        Ok(tables.principals.get(&id).cloned())
    }

    async fn save(&self, principal: NewPrincipal, at: OffsetDateTime) -> StorageResult<Principal> {
        let mut tables = self.tables.write().await;
        if tables
            .principals
            .values()
            .any(|p| p.login_id == principal.login_id)
        {
            return Err(StorageError::unique_violation(
                constraints::PRINCIPAL_LOGIN_ID,
            ));
        }

        let id = tables.next_principal_id();
        let row = principal.into_principal(id, at);
        tables.principals.insert(id, row.clone());
        Ok(row)
    }

    async fn delete(&self, id: PrincipalId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.principals.contains_key(&id) {
            return Ok(false);
        }

        let owned: Vec<_> = tables
            .patients
            .values()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect();
        if tables
            .mappings
            .values()
            .any(|m| owned.contains(&m.patient_id))
        {
            return Err(StorageError::foreign_key_violation(
                constraints::MAPPING_PATIENT_FK,
            ));
        }

        tables.patients.retain(|_, p| p.owner_id != id);
        tables.principals.remove(&id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use carelink_storage::{ClinicStorage, Gender, NewDoctor, NewPatient};
    use time::macros::datetime;

    use super::*;

    const T0: OffsetDateTime = datetime!(2024-05-01 10:00:00 UTC);

    fn alice() -> NewPrincipal {
        NewPrincipal::active("a@x.com", "Alice", "hash".into())
    }

    #[tokio::test]
    async fn test_save_assigns_ids_and_enforces_unique_login() {
        let storage = InMemoryStorage::new();
        let first = storage.save(alice(), T0).await.unwrap();
        assert_eq!(first.id, 1);

        let err = storage.save(alice(), T0).await.unwrap_err();
        assert!(err.is_unique_violation_of(constraints::PRINCIPAL_LOGIN_ID));

        // Login ids are compared verbatim.
        let upper = NewPrincipal::active("A@x.com", "Alice", "hash".into());
        assert_eq!(storage.save(upper, T0).await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_find_by_login_id_is_exact() {
        let storage = InMemoryStorage::new();
        let saved = storage.save(alice(), T0).await.unwrap();

        let found = storage.find_by_login_id("a@x.com").await.unwrap();
        assert_eq!(found, Some(saved.clone()));
        assert!(storage.find_by_login_id("A@X.COM").await.unwrap().is_none());
        assert_eq!(storage.find_by_id(saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_delete_cascades_unmapped_patients() {
        let storage = InMemoryStorage::new();
        let owner = storage.save(alice(), T0).await.unwrap().id;
        let patient = storage
            .insert_patient(
                NewPatient {
                    owner_id: owner,
                    name: "John".into(),
                    age: 45,
                    gender: Gender::Male,
                    address: String::new(),
                },
                T0,
            )
            .await
            .unwrap();
        let doctor = storage
            .insert_doctor(
                NewDoctor {
                    name: "Dr. Lee".into(),
                    specialization: "Cardiology".into(),
                },
                T0,
            )
            .await
            .unwrap();
        let mapping = storage
            .insert_mapping(patient.id, doctor.id, T0)
            .await
            .unwrap();

        let err = storage.delete(owner).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert!(storage.find_by_id(owner).await.unwrap().is_some());

        assert!(storage.delete_mapping(owner, mapping.id).await.unwrap());
        assert!(storage.delete(owner).await.unwrap());
        assert!(storage.find_by_id(owner).await.unwrap().is_none());
        assert!(storage.list_patients(owner).await.unwrap().is_empty());
        assert!(!storage.delete(owner).await.unwrap());
    }
}
