use carelink_core::{RecordId, SharedClock};
use carelink_storage::{Doctor, DynClinicStorage, MappingTarget};

use crate::input::{DoctorInput, UpdateMode};
use crate::integrity::DeletionGuard;
use crate::{RecordsError, RecordsResult};

const ENTITY: &str = "doctor";

/// The shared doctor directory. Any authenticated principal may read and
/// write every doctor.
#[derive(Clone)]
pub struct DoctorService {
    storage: DynClinicStorage,
    clock: SharedClock,
    guard: DeletionGuard,
}

impl DoctorService {
    #[must_use]
    pub fn new(storage: DynClinicStorage, clock: SharedClock, guard: DeletionGuard) -> Self {
        Self {
            storage,
            clock,
            guard,
        }
    }

    /// Lists every doctor, newest first.
    pub async fn list(&self) -> RecordsResult<Vec<Doctor>> {
        Ok(self.storage.list_doctors().await?)
    }

    pub async fn get(&self, id: RecordId) -> RecordsResult<Doctor> {
        self.storage
            .find_doctor(id)
            .await?
            .ok_or_else(|| RecordsError::not_found(ENTITY, id))
    }

    pub async fn create(&self, input: DoctorInput) -> RecordsResult<Doctor> {
        let new = input.into_new()?;
        let doctor = self.storage.insert_doctor(new, self.clock.now()).await?;
        tracing::info!(doctor_id = doctor.id, "doctor created");
        Ok(doctor)
    }

    pub async fn update(
        &self,
        id: RecordId,
        input: DoctorInput,
        mode: UpdateMode,
    ) -> RecordsResult<Doctor> {
        self.get(id).await?;
        let changes = input.into_changes(mode)?;
        self.storage
            .update_doctor(id, changes, self.clock.now())
            .await?
            .ok_or_else(|| RecordsError::not_found(ENTITY, id))
    }

    /// Deletes a doctor.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Referenced` while any mapping references it.
    pub async fn delete(&self, id: RecordId) -> RecordsResult<()> {
        self.get(id).await?;

        let target = MappingTarget::Doctor(id);
        self.guard.ensure_deletable(target).await?;

        let deleted = self
            .storage
            .delete_doctor(id)
            .await
            .map_err(|e| DeletionGuard::translate(target, e))?;
        if !deleted {
            return Err(RecordsError::not_found(ENTITY, id));
        }
        tracing::info!(doctor_id = id, "doctor deleted");
        Ok(())
    }
}
