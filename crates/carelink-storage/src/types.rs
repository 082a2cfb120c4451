//! Record types stored by every backend.

use std::fmt;
use std::str::FromStr;

use carelink_core::{PrincipalId, RecordId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Patient gender, the fixed category set of a patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Every accepted value, in declaration order.
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown gender value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGender(s.to_string()))
    }
}

/// A patient record, private to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub id: RecordId,
    #[serde(skip_serializing)]
    pub owner_id: PrincipalId,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated input for a new patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub owner_id: PrincipalId,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub address: String,
}

/// Validated changes to an existing patient. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

impl PatientChanges {
    /// Applies the changes to `patient` and stamps `updated_at`.
    pub fn apply(self, patient: &mut Patient, at: OffsetDateTime) {
        if let Some(name) = self.name {
            patient.name = name;
        }
        if let Some(age) = self.age {
            patient.age = age;
        }
        if let Some(gender) = self.gender {
            patient.gender = gender;
        }
        if let Some(address) = self.address {
            patient.address = address;
        }
        patient.updated_at = at;
    }
}

/// A doctor record, shared by all principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: RecordId,
    pub name: String,
    pub specialization: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated input for a new doctor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoctor {
    pub name: String,
    pub specialization: String,
}

/// Validated changes to an existing doctor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorChanges {
    pub name: Option<String>,
    pub specialization: Option<String>,
}

impl DoctorChanges {
    /// Applies the changes to `doctor` and stamps `updated_at`.
    pub fn apply(self, doctor: &mut Doctor, at: OffsetDateTime) {
        if let Some(name) = self.name {
            doctor.name = name;
        }
        if let Some(specialization) = self.specialization {
            doctor.specialization = specialization;
        }
        doctor.updated_at = at;
    }
}

/// Association between a patient and a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub id: RecordId,
    #[serde(rename = "patient")]
    pub patient_id: RecordId,
    #[serde(rename = "doctor")]
    pub doctor_id: RecordId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A record that mappings can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingTarget {
    Patient(RecordId),
    Doctor(RecordId),
}

impl MappingTarget {
    #[must_use]
    pub fn entity(&self) -> &'static str {
        match self {
            MappingTarget::Patient(_) => "patient",
            MappingTarget::Doctor(_) => "doctor",
        }
    }

    #[must_use]
    pub fn id(&self) -> RecordId {
        match self {
            MappingTarget::Patient(id) | MappingTarget::Doctor(id) => *id,
        }
    }

    /// Returns `true` if `mapping` references this target.
    #[must_use]
    pub fn is_referenced_by(&self, mapping: &Mapping) -> bool {
        match self {
            MappingTarget::Patient(id) => mapping.patient_id == *id,
            MappingTarget::Doctor(id) => mapping.doctor_id == *id,
        }
    }
}
