//! Client input for record writes.
//!
//! Inputs keep raw JSON values so every field can be checked on its own and
//! reported under its own key. Unknown fields, including `id`, `owner` and
//! the timestamps, are ignored.

use std::str::FromStr;

use carelink_core::validation::MSG_REQUIRED;
use carelink_core::{FieldErrors, PrincipalId, RecordId};
use carelink_storage::{DoctorChanges, Gender, NewDoctor, NewPatient, PatientChanges};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const MAX_NAME_CHARS: usize = 120;
const MAX_SPECIALIZATION_CHARS: usize = 120;
const MAX_AGE: i64 = 2_147_483_647;

const MSG_NULL: &str = "This field may not be null.";
const MSG_NOT_STRING: &str = "Not a valid string.";
const MSG_NOT_INTEGER: &str = "A valid integer is required.";

/// How an update treats absent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Every required field must be present (PUT).
    Full,
    /// Any subset of fields may be present (PATCH).
    Partial,
}

impl UpdateMode {
    fn requires_all(self) -> bool {
        matches!(self, UpdateMode::Full)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Reads typed fields out of raw values, collecting errors as it goes.
struct FieldReader {
    errors: FieldErrors,
    require_all: bool,
}

impl FieldReader {
    fn new(require_all: bool) -> Self {
        Self {
            errors: FieldErrors::new(),
            require_all,
        }
    }

    fn present(&mut self, field: &str, value: Option<Value>, required: bool) -> Option<Value> {
        match value {
            None => {
                if required && self.require_all {
                    self.errors.add(field, MSG_REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.errors.add(field, MSG_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, field: &str, value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.errors.add(field, MSG_NOT_STRING);
                None
            }
        }
    }

    /// A required, non-blank, length-bounded string.
    fn text(&mut self, field: &str, value: Option<Value>, max_chars: usize) -> Option<String> {
        let value = self.present(field, value, true)?;
        let text = self.string(field, value)?;
        let before = self.errors.get(field).len();
        self.errors.check_text(field, &text, max_chars);
        (self.errors.get(field).len() == before).then_some(text)
    }

    /// An optional free-text string that may be blank.
    fn free_text(&mut self, field: &str, value: Option<Value>) -> Option<String> {
        let value = self.present(field, value, false)?;
        self.string(field, value)
    }

    fn integer(&mut self, field: &str, value: Option<Value>, min: i64, max: i64) -> Option<i64> {
        let value = self.present(field, value, true)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(number) = parsed else {
            self.errors.add(field, MSG_NOT_INTEGER);
            return None;
        };
        let before = self.errors.get(field).len();
        self.errors.check_range(field, number, min, max);
        (self.errors.get(field).len() == before).then_some(number)
    }

    fn choice<T>(&mut self, field: &str, value: Option<Value>) -> Option<T>
    where
        T: FromStr,
        T::Err: ToString,
    {
        let value = self.present(field, value, true)?;
        let raw = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        match raw.parse::<T>() {
            Ok(choice) => Some(choice),
            Err(e) => {
                self.errors.add(field, e.to_string());
                None
            }
        }
    }

    fn reference(&mut self, field: &str, value: Option<Value>) -> Option<RecordId> {
        let value = self.present(field, value, true)?;
        let id = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if id.is_none() {
            self.errors.add(
                field,
                format!("Incorrect type. Expected pk value, received {}.", type_name(&value)),
            );
        }
        id
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        self.errors.into_result(value)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

// ==================== Patients ====================

/// Patient fields as sent by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientInput {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Value>,
}

impl PatientInput {
    /// Validates the input as a set of changes.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_changes(self, mode: UpdateMode) -> Result<PatientChanges, FieldErrors> {
        let mut reader = FieldReader::new(mode.requires_all());
        let changes = PatientChanges {
            name: reader.text("name", self.name, MAX_NAME_CHARS),
            age: reader
                .integer("age", self.age, 0, MAX_AGE)
                .and_then(|age| u32::try_from(age).ok()),
            gender: reader.choice::<Gender>("gender", self.gender),
            address: reader.free_text("address", self.address),
        };
        reader.finish(changes)
    }

    /// Validates the input as a new patient owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_new(self, owner: PrincipalId) -> Result<NewPatient, FieldErrors> {
        let changes = self.into_changes(UpdateMode::Full)?;
        match (changes.name, changes.age, changes.gender) {
            (Some(name), Some(age), Some(gender)) => Ok(NewPatient {
                owner_id: owner,
                name,
                age,
                gender,
                address: changes.address.unwrap_or_default(),
            }),
            _ => Err(FieldErrors::single(
                carelink_core::NON_FIELD_ERRORS,
                MSG_REQUIRED,
            )),
        }
    }
}

// ==================== Doctors ====================

/// Doctor fields as sent by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorInput {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub specialization: Option<Value>,
}

impl DoctorInput {
    /// Validates the input as a set of changes.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_changes(self, mode: UpdateMode) -> Result<DoctorChanges, FieldErrors> {
        let mut reader = FieldReader::new(mode.requires_all());
        let changes = DoctorChanges {
            name: reader.text("name", self.name, MAX_NAME_CHARS),
            specialization: reader.text(
                "specialization",
                self.specialization,
                MAX_SPECIALIZATION_CHARS,
            ),
        };
        reader.finish(changes)
    }

    /// Validates the input as a new doctor.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_new(self) -> Result<NewDoctor, FieldErrors> {
        let changes = self.into_changes(UpdateMode::Full)?;
        match (changes.name, changes.specialization) {
            (Some(name), Some(specialization)) => Ok(NewDoctor {
                name,
                specialization,
            }),
            _ => Err(FieldErrors::single(
                carelink_core::NON_FIELD_ERRORS,
                MSG_REQUIRED,
            )),
        }
    }
}

// ==================== Mappings ====================

/// Mapping creation body: `{"patient": <id>, "doctor": <id>}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingInput {
    #[serde(default, deserialize_with = "present")]
    pub patient: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub doctor: Option<Value>,
}

impl MappingInput {
    /// Convenience constructor for callers that already hold ids.
    #[must_use]
    pub fn new(patient: RecordId, doctor: RecordId) -> Self {
        Self {
            patient: Some(Value::from(patient)),
            doctor: Some(Value::from(doctor)),
        }
    }

    /// Returns the `(patient, doctor)` ids.
    ///
    /// # Errors
    ///
    /// Returns field errors for missing or non-integer references.
    pub fn into_pair(self) -> Result<(RecordId, RecordId), FieldErrors> {
        let mut reader = FieldReader::new(true);
        let patient = reader.reference("patient", self.patient);
        let doctor = reader.reference("doctor", self.doctor);
        let pair = reader.finish((patient, doctor))?;
        match pair {
            (Some(patient), Some(doctor)) => Ok((patient, doctor)),
            _ => Err(FieldErrors::single(
                carelink_core::NON_FIELD_ERRORS,
                MSG_REQUIRED,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn patient(value: Value) -> PatientInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_patient() {
        let new = patient(json!({"name": "John", "age": 45, "gender": "male"}))
            .into_new(7)
            .unwrap();
        assert_eq!(new.owner_id, 7);
        assert_eq!(new.name, "John");
        assert_eq!(new.age, 45);
        assert_eq!(new.gender, Gender::Male);
        assert_eq!(new.address, "");
    }

    #[test]
    fn test_client_owner_and_id_ignored() {
        let new = patient(json!({
            "id": 999, "owner": 1, "created_at": "2000-01-01T00:00:00Z",
            "name": "John", "age": 45, "gender": "male"
        }))
        .into_new(7)
        .unwrap();
        assert_eq!(new.owner_id, 7);
    }

    #[test]
    fn test_patient_errors_collected_per_field() {
        let errors = patient(json!({"name": "  ", "age": -1, "gender": "robot", "address": null}))
            .into_new(7)
            .unwrap_err();
        assert_eq!(errors.get("name"), ["This field may not be blank.".to_string()]);
        assert_eq!(
            errors.get("age"),
            ["Ensure this value is greater than or equal to 0.".to_string()]
        );
        assert_eq!(
            errors.get("gender"),
            ["\"robot\" is not a valid choice.".to_string()]
        );
        assert_eq!(errors.get("address"), ["This field may not be null.".to_string()]);
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = patient(json!({})).into_new(7).unwrap_err();
        for field in ["name", "age", "gender"] {
            assert_eq!(errors.get(field), ["This field is required.".to_string()]);
        }
        assert!(!errors.contains("address"));
    }

    #[test]
    fn test_age_bounds_and_types() {
        let errors = patient(json!({"name": "J", "age": 2_147_483_648_i64, "gender": "other"}))
            .into_new(1)
            .unwrap_err();
        assert_eq!(
            errors.get("age"),
            ["Ensure this value is less than or equal to 2147483647.".to_string()]
        );

        let errors = patient(json!({"name": "J", "age": "old", "gender": "other"}))
            .into_new(1)
            .unwrap_err();
        assert_eq!(errors.get("age"), ["A valid integer is required.".to_string()]);

        let new = patient(json!({"name": "J", "age": "30", "gender": "other"}))
            .into_new(1)
            .unwrap();
        assert_eq!(new.age, 30);
    }

    #[test]
    fn test_name_length_counts_chars() {
        let ok = "é".repeat(120);
        assert!(
            patient(json!({"name": ok, "age": 1, "gender": "female"}))
                .into_new(1)
                .is_ok()
        );
        let too_long = "x".repeat(121);
        let errors = patient(json!({"name": too_long, "age": 1, "gender": "female"}))
            .into_new(1)
            .unwrap_err();
        assert_eq!(
            errors.get("name"),
            ["Ensure this field has no more than 120 characters.".to_string()]
        );
    }

    #[test]
    fn test_partial_update_accepts_subset() {
        let changes = patient(json!({"age": 50}))
            .into_changes(UpdateMode::Partial)
            .unwrap();
        assert_eq!(changes.age, Some(50));
        assert!(changes.name.is_none());

        let errors = patient(json!({"age": 50}))
            .into_changes(UpdateMode::Full)
            .unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("gender"));
    }

    #[test]
    fn test_doctor_input() {
        let new = serde_json::from_value::<DoctorInput>(
            json!({"name": "Dr. Lee", "specialization": "Cardiology"}),
        )
        .unwrap()
        .into_new()
        .unwrap();
        assert_eq!(new.specialization, "Cardiology");

        let errors = serde_json::from_value::<DoctorInput>(json!({"name": true}))
            .unwrap()
            .into_new()
            .unwrap_err();
        assert_eq!(errors.get("name"), ["Not a valid string.".to_string()]);
        assert_eq!(
            errors.get("specialization"),
            ["This field is required.".to_string()]
        );
    }

    #[test]
    fn test_mapping_input() {
        let pair = serde_json::from_value::<MappingInput>(json!({"patient": 1, "doctor": "2"}))
            .unwrap()
            .into_pair()
            .unwrap();
        assert_eq!(pair, (1, 2));

        let errors = serde_json::from_value::<MappingInput>(json!({"patient": "x"}))
            .unwrap()
            .into_pair()
            .unwrap_err();
        assert_eq!(
            errors.get("patient"),
            ["Incorrect type. Expected pk value, received str.".to_string()]
        );
        assert_eq!(errors.get("doctor"), ["This field is required.".to_string()]);
    }
}
