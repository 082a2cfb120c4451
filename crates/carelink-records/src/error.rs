use carelink_api::ApiError;
use carelink_core::{ErrorKind, FieldErrors, RecordId};
use carelink_storage::StorageError;

pub(crate) const MSG_NOT_FOUND: &str = "Not found.";
pub(crate) const MSG_ALREADY_ASSIGNED: &str = "This doctor is already assigned to this patient.";

/// Errors returned by the record services.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    /// Input failed field validation.
    #[error("Validation failed: {errors}")]
    Validation {
        /// Messages keyed by input field.
        errors: FieldErrors,
    },

    /// The record does not exist or is not visible to the caller.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The kind of record looked up.
        entity: &'static str,
        /// The identifier looked up.
        id: RecordId,
    },

    /// The doctor is already mapped to the patient.
    #[error("doctor {doctor_id} already assigned to patient {patient_id}")]
    AlreadyAssigned {
        patient_id: RecordId,
        doctor_id: RecordId,
    },

    /// The record cannot be deleted while mappings reference it.
    #[error("{entity} {id} is referenced by mappings")]
    Referenced {
        /// The kind of record whose deletion was refused.
        entity: &'static str,
        /// Its identifier.
        id: RecordId,
    },

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RecordsError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: RecordId) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyAssigned { .. } | Self::Referenced { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// The message shown to clients. Never contains storage detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation { .. } => "Invalid input.".to_string(),
            Self::NotFound { .. } => MSG_NOT_FOUND.to_string(),
            Self::AlreadyAssigned { .. } => MSG_ALREADY_ASSIGNED.to_string(),
            Self::Referenced { entity, .. } => format!(
                "Cannot delete {entity}. Please delete all associated patient-doctor mappings first."
            ),
            Self::Storage(_) => "Internal server error".to_string(),
        }
    }
}

impl From<FieldErrors> for RecordsError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }
}

impl From<RecordsError> for ApiError {
    fn from(err: RecordsError) -> Self {
        let message = err.public_message();
        match err {
            RecordsError::Validation { errors } => ApiError::validation(errors),
            RecordsError::NotFound { .. } => ApiError::not_found(message),
            RecordsError::AlreadyAssigned { .. } | RecordsError::Referenced { .. } => {
                ApiError::conflict(message)
            }
            RecordsError::Storage(source) => ApiError::internal(source.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_hides_identity() {
        let api = ApiError::from(RecordsError::not_found("patient", 42));
        assert_eq!(api.kind(), ErrorKind::NotFound);
        assert_eq!(api.to_error_body().error.message, "Not found.");
    }

    #[test]
    fn test_referenced_message_names_entity() {
        let err = RecordsError::Referenced {
            entity: "doctor",
            id: 3,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.public_message(),
            "Cannot delete doctor. Please delete all associated patient-doctor mappings first."
        );
    }

    #[test]
    fn test_storage_detail_not_exposed() {
        let err = RecordsError::from(StorageError::foreign_key_violation("mapping_doctor_fk"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        let api = ApiError::from(err);
        assert_eq!(api.to_error_body().error.message, "Internal server error");
    }
}
