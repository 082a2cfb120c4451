//! # carelink-storage
//!
//! Storage abstraction layer for the Carelink service.
//!
//! This crate defines the record types, the error type and the
//! [`ClinicStorage`] trait that every relational backend implements. It does
//! not contain any implementation; see `carelink-db-memory` and
//! `carelink-db-postgres`.
//!
//! ## Constraint model
//!
//! Backends are the source of truth for integrity. They must enforce:
//!
//! - uniqueness of the `(patient, doctor)` pair across mappings,
//! - mapping references to patients and doctors (delete is refused, never cascaded),
//! - patient ownership by an existing principal (principal removal cascades).
//!
//! Violations surface as [`StorageError::UniqueViolation`] and
//! [`StorageError::ForeignKeyViolation`] carrying the constraint name from
//! [`constraints`].

mod error;
mod traits;
mod types;

pub use error::StorageError;
pub use traits::ClinicStorage;
pub use types::{
    Doctor, DoctorChanges, Gender, Mapping, MappingTarget, NewDoctor, NewPatient, Patient,
    PatientChanges, UnknownGender,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shareable storage trait object.
pub type DynClinicStorage = std::sync::Arc<dyn ClinicStorage>;

/// Names of the integrity constraints every backend enforces.
pub mod constraints {
    /// Unique login identifier across principals.
    pub const PRINCIPAL_LOGIN_ID: &str = "principal_login_id_key";
    /// Patient owner must reference an existing principal.
    pub const PATIENT_OWNER_FK: &str = "patient_owner_fk";
    /// At most one mapping per (patient, doctor) pair.
    pub const UNIQ_PATIENT_DOCTOR: &str = "uniq_patient_doctor";
    /// Mapping must reference an existing patient; blocks patient deletion.
    pub const MAPPING_PATIENT_FK: &str = "mapping_patient_fk";
    /// Mapping must reference an existing doctor; blocks doctor deletion.
    pub const MAPPING_DOCTOR_FK: &str = "mapping_doctor_fk";
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::StorageError;
    pub use crate::traits::ClinicStorage;
    pub use crate::types::{
        Doctor, DoctorChanges, Gender, Mapping, MappingTarget, NewDoctor, NewPatient, Patient,
        PatientChanges,
    };
    pub use crate::{DynClinicStorage, StorageResult, constraints};
}
