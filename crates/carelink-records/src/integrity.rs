//! Deletion guard for records referenced by mappings.
//!
//! The check here is a fast fail with a friendly message. The store's
//! referential constraint decides the outcome when a mapping is committed
//! between the check and the delete; [`DeletionGuard::translate`] maps that
//! rejection to the same error.

use carelink_storage::{DynClinicStorage, MappingTarget, StorageError};

use crate::{RecordsError, RecordsResult};

#[derive(Clone)]
pub struct DeletionGuard {
    storage: DynClinicStorage,
}

impl DeletionGuard {
    #[must_use]
    pub fn new(storage: DynClinicStorage) -> Self {
        Self { storage }
    }

    /// Returns `true` if any mapping currently references `target`.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Storage` if the lookup fails.
    pub async fn is_referenced(&self, target: MappingTarget) -> RecordsResult<bool> {
        Ok(self.storage.has_mappings(target).await?)
    }

    /// Fails with `RecordsError::Referenced` while mappings reference `target`.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Referenced` or `RecordsError::Storage`.
    pub async fn ensure_deletable(&self, target: MappingTarget) -> RecordsResult<()> {
        if self.is_referenced(target).await? {
            tracing::debug!(
                entity = target.entity(),
                id = target.id(),
                "delete refused: mappings reference record"
            );
            return Err(Self::referenced(target));
        }
        Ok(())
    }

    /// Maps a storage rejection of a delete of `target`.
    #[must_use]
    pub fn translate(target: MappingTarget, err: StorageError) -> RecordsError {
        if err.is_foreign_key_violation() {
            tracing::debug!(
                entity = target.entity(),
                id = target.id(),
                "delete rejected by store constraint"
            );
            return Self::referenced(target);
        }
        RecordsError::Storage(err)
    }

    fn referenced(target: MappingTarget) -> RecordsError {
        RecordsError::Referenced {
            entity: target.entity(),
            id: target.id(),
        }
    }
}
