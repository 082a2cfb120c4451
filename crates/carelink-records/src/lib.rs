//! # carelink-records
//!
//! Ownership-scoped record services and the relationship integrity engine.
//!
//! Every operation takes the acting principal as an explicit argument and
//! filters at the storage boundary. A patient owned by someone else is
//! reported exactly like a missing one.
//!
//! - [`PatientService`] - private records, scoped to their owner
//! - [`DoctorService`] - the shared doctor directory
//! - [`MappingService`] - patient/doctor assignments
//! - [`DeletionGuard`] - refuses deletes while mappings reference a record
//!
//! Application-level checks give fast, specific errors; the storage
//! constraints remain the correctness backstop under concurrency.

mod doctors;
mod error;
mod input;
mod integrity;
mod mappings;
mod patients;

use carelink_core::SharedClock;
use carelink_storage::DynClinicStorage;

pub use doctors::DoctorService;
pub use error::RecordsError;
pub use input::{DoctorInput, MappingInput, PatientInput, UpdateMode};
pub use integrity::DeletionGuard;
pub use mappings::MappingService;
pub use patients::PatientService;

/// Type alias for record operation results.
pub type RecordsResult<T> = Result<T, RecordsError>;

/// All record services over one storage backend.
#[derive(Clone)]
pub struct Records {
    pub patients: PatientService,
    pub doctors: DoctorService,
    pub mappings: MappingService,
}

impl Records {
    #[must_use]
    pub fn new(storage: DynClinicStorage, clock: SharedClock) -> Self {
        let guard = DeletionGuard::new(storage.clone());
        Self {
            patients: PatientService::new(storage.clone(), clock.clone(), guard.clone()),
            doctors: DoctorService::new(storage.clone(), clock.clone(), guard),
            mappings: MappingService::new(storage, clock),
        }
    }
}
