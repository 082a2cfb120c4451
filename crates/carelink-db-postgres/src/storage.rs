//! PostgreSQL implementation of the storage traits.

use async_trait::async_trait;
use carelink_auth::{CredentialStore, NewPrincipal, Principal};
use carelink_core::{PrincipalId, RecordId};
use carelink_storage::{
    ClinicStorage, Doctor, DoctorChanges, Mapping, MappingTarget, NewDoctor, NewPatient, Patient,
    PatientChanges, StorageError, StorageResult,
};
use sqlx_postgres::PgPool;
use time::OffsetDateTime;

use crate::config::PostgresConfig;
use crate::error::map_sqlx_error;
use crate::queries::{doctors, mappings, patients, principals};
use crate::{migrations, pool};

/// PostgreSQL storage backend.
///
/// Uniqueness and referential integrity are enforced by the schema; the
/// backend only translates violations into `StorageError` variants.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new `PostgresStorage` with the given configuration.
    ///
    /// This will:
    /// 1. Create a connection pool
    /// 2. Run migrations (if configured)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl ClinicStorage for PostgresStorage {
    async fn insert_patient(
        &self,
        patient: NewPatient,
        at: OffsetDateTime,
    ) -> StorageResult<Patient> {
        patients::insert(&self.pool, patient, at).await
    }

    async fn list_patients(&self, owner: PrincipalId) -> StorageResult<Vec<Patient>> {
        patients::list(&self.pool, owner).await
    }

    async fn find_patient(
        &self,
        owner: PrincipalId,
        id: RecordId,
    ) -> StorageResult<Option<Patient>> {
        patients::find(&self.pool, owner, id).await
    }

    async fn update_patient(
        &self,
        owner: PrincipalId,
        id: RecordId,
        changes: PatientChanges,
        at: OffsetDateTime,
    ) -> StorageResult<Option<Patient>> {
        patients::update(&self.pool, owner, id, changes, at).await
    }

    async fn delete_patient(&self, owner: PrincipalId, id: RecordId) -> StorageResult<bool> {
        patients::delete(&self.pool, owner, id).await
    }

    async fn insert_doctor(&self, doctor: NewDoctor, at: OffsetDateTime) -> StorageResult<Doctor> {
        doctors::insert(&self.pool, doctor, at).await
    }

    async fn list_doctors(&self) -> StorageResult<Vec<Doctor>> {
        doctors::list(&self.pool).await
    }

    async fn find_doctor(&self, id: RecordId) -> StorageResult<Option<Doctor>> {
        doctors::find(&self.pool, id).await
    }

    async fn update_doctor(
        &self,
        id: RecordId,
        changes: DoctorChanges,
        at: OffsetDateTime,
    ) -> StorageResult<Option<Doctor>> {
        doctors::update(&self.pool, id, changes, at).await
    }

    async fn delete_doctor(&self, id: RecordId) -> StorageResult<bool> {
        doctors::delete(&self.pool, id).await
    }

    async fn insert_mapping(
        &self,
        patient_id: RecordId,
        doctor_id: RecordId,
        at: OffsetDateTime,
    ) -> StorageResult<Mapping> {
        mappings::insert(&self.pool, patient_id, doctor_id, at).await
    }

    async fn mapping_exists(
        &self,
        patient_id: RecordId,
        doctor_id: RecordId,
    ) -> StorageResult<bool> {
        mappings::exists(&self.pool, patient_id, doctor_id).await
    }

    async fn list_mappings(&self, owner: PrincipalId) -> StorageResult<Vec<Mapping>> {
        mappings::list(&self.pool, owner).await
    }

    async fn find_mapping(
        &self,
        owner: PrincipalId,
        id: RecordId,
    ) -> StorageResult<Option<Mapping>> {
        mappings::find(&self.pool, owner, id).await
    }

    async fn delete_mapping(&self, owner: PrincipalId, id: RecordId) -> StorageResult<bool> {
        mappings::delete(&self.pool, owner, id).await
    }

    async fn list_doctors_for_patient(&self, patient_id: RecordId) -> StorageResult<Vec<Doctor>> {
        mappings::doctors_for_patient(&self.pool, patient_id).await
    }

    async fn has_mappings(&self, target: MappingTarget) -> StorageResult<bool> {
        mappings::references(&self.pool, target).await
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx_core::query::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait]
impl CredentialStore for PostgresStorage {
    async fn find_by_login_id(&self, login_id: &str) -> StorageResult<Option<Principal>> {
        principals::find_by_login_id(&self.pool, login_id).await
    }

    async fn find_by_id(&self, id: PrincipalId) -> StorageResult<Option<Principal>> {
        principals::find_by_id(&self.pool, id).await
    }

    async fn save(&self, principal: NewPrincipal, at: OffsetDateTime) -> StorageResult<Principal> {
        principals::insert(&self.pool, principal, at).await
    }

    async fn delete(&self, id: PrincipalId) -> StorageResult<bool> {
        principals::delete(&self.pool, id).await
    }
}
