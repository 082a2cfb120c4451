use std::sync::Arc;

use carelink_auth::{CredentialStore, NewPrincipal};
use carelink_core::{ErrorKind, PrincipalId, SystemClock};
use carelink_db_memory::InMemoryStorage;
use carelink_records::{
    DoctorInput, MappingInput, PatientInput, Records, RecordsError, UpdateMode,
};
use futures_util::future::join_all;
use serde_json::json;
use time::OffsetDateTime;

struct Fixture {
    storage: Arc<InMemoryStorage>,
    records: Records,
}

impl Fixture {
    fn new() -> Self {
        let storage = InMemoryStorage::shared();
        let records = Records::new(storage.clone(), SystemClock::shared());
        Self { storage, records }
    }

    async fn principal(&self, email: &str) -> PrincipalId {
        self.storage
            .save(
                NewPrincipal::active(email, "Someone", "hash".into()),
                OffsetDateTime::now_utc(),
            )
            .await
            .expect("save principal")
            .id
    }
}

fn patient(body: serde_json::Value) -> PatientInput {
    serde_json::from_value(body).expect("patient input")
}

fn doctor(body: serde_json::Value) -> DoctorInput {
    serde_json::from_value(body).expect("doctor input")
}

fn john() -> PatientInput {
    patient(json!({"name": "John", "age": 45, "gender": "male"}))
}

fn lee() -> DoctorInput {
    doctor(json!({"name": "Dr. Lee", "specialization": "Cardiology"}))
}

#[tokio::test]
async fn patient_crud_is_scoped_to_owner() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;
    let bob = fx.principal("bob@x.com").await;

    let created = fx.records.patients.create(alice, john()).await.unwrap();
    assert_eq!(created.owner_id, alice);
    assert_eq!(created.address, "");

    let listed = fx.records.patients.list(alice).await.unwrap();
    assert_eq!(listed, vec![created.clone()]);
    assert!(fx.records.patients.list(bob).await.unwrap().is_empty());

    let err = fx.records.patients.get(bob, created.id).await.unwrap_err();
    assert!(matches!(err, RecordsError::NotFound { .. }));

    // Bob cannot see the patient, so even an invalid body yields NotFound.
    let err = fx
        .records
        .patients
        .update(bob, created.id, patient(json!({"age": -1})), UpdateMode::Partial)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fx.records.patients.delete(bob, created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(fx.records.patients.get(alice, created.id).await.is_ok());
}

#[tokio::test]
async fn partial_update_keeps_omitted_fields() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;
    let created = fx.records.patients.create(alice, john()).await.unwrap();

    let updated = fx
        .records
        .patients
        .update(alice, created.id, patient(json!({"age": 46})), UpdateMode::Partial)
        .await
        .unwrap();
    assert_eq!(updated.age, 46);
    assert_eq!(updated.name, "John");
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);

    let err = fx
        .records
        .patients
        .update(alice, created.id, patient(json!({"age": 47})), UpdateMode::Full)
        .await
        .unwrap_err();
    let RecordsError::Validation { errors } = err else {
        panic!("expected validation error");
    };
    assert!(errors.contains("name"));
    assert!(errors.contains("gender"));
    assert!(!errors.contains("age"));
}

#[tokio::test]
async fn patient_validation_reports_every_field() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;

    let err = fx
        .records
        .patients
        .create(
            alice,
            patient(json!({"name": "", "age": -5, "gender": "robot"})),
        )
        .await
        .unwrap_err();
    let RecordsError::Validation { errors } = err else {
        panic!("expected validation error");
    };
    assert!(errors.contains("name"));
    assert!(errors.contains("age"));
    assert_eq!(errors.get("gender"), ["\"robot\" is not a valid choice."]);
    assert!(fx.records.patients.list(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn doctors_are_shared_between_principals() {
    let fx = Fixture::new();
    let created = fx.records.doctors.create(lee()).await.unwrap();

    assert_eq!(fx.records.doctors.get(created.id).await.unwrap(), created);
    assert_eq!(fx.records.doctors.list().await.unwrap().len(), 1);

    let updated = fx
        .records
        .doctors
        .update(
            created.id,
            doctor(json!({"specialization": "Neurology"})),
            UpdateMode::Partial,
        )
        .await
        .unwrap();
    assert_eq!(updated.specialization, "Neurology");
    assert_eq!(updated.name, "Dr. Lee");

    let err = fx.records.doctors.get(created.id + 100).await.unwrap_err();
    assert_eq!(err.public_message(), "Not found.");
}

#[tokio::test]
async fn mapping_lifecycle_guards_deletes() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;
    let john = fx.records.patients.create(alice, john()).await.unwrap();
    let lee = fx.records.doctors.create(lee()).await.unwrap();

    let mapping = fx
        .records
        .mappings
        .create(alice, MappingInput::new(john.id, lee.id))
        .await
        .unwrap();
    assert_eq!(mapping.patient_id, john.id);
    assert_eq!(mapping.doctor_id, lee.id);

    let err = fx
        .records
        .mappings
        .create(alice, MappingInput::new(john.id, lee.id))
        .await
        .unwrap_err();
    assert_eq!(
        err.public_message(),
        "This doctor is already assigned to this patient."
    );

    let doctors = fx
        .records
        .mappings
        .doctors_for_patient(alice, john.id)
        .await
        .unwrap();
    assert_eq!(doctors, vec![lee.clone()]);

    let err = fx.records.doctors.delete(lee.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.public_message(),
        "Cannot delete doctor. Please delete all associated patient-doctor mappings first."
    );
    let err = fx.records.patients.delete(alice, john.id).await.unwrap_err();
    assert!(matches!(err, RecordsError::Referenced { entity: "patient", .. }));

    let removed = fx.records.mappings.delete(alice, mapping.id).await.unwrap();
    assert_eq!(removed, mapping);
    assert!(fx.records.mappings.list(alice).await.unwrap().is_empty());
    let err = fx.records.mappings.delete(alice, mapping.id).await.unwrap_err();
    assert!(matches!(err, RecordsError::NotFound { entity: "mapping", .. }));
    // Removing the mapping leaves both sides in place.
    assert!(fx.records.patients.get(alice, john.id).await.is_ok());
    assert!(fx.records.doctors.get(lee.id).await.is_ok());

    fx.records.doctors.delete(lee.id).await.unwrap();
    fx.records.patients.delete(alice, john.id).await.unwrap();
}

#[tokio::test]
async fn mapping_requires_owned_patient_and_existing_doctor() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;
    let bob = fx.principal("bob@x.com").await;
    let john = fx.records.patients.create(alice, john()).await.unwrap();
    let lee = fx.records.doctors.create(lee()).await.unwrap();

    let err = fx
        .records
        .mappings
        .create(bob, MappingInput::new(john.id, lee.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RecordsError::NotFound { entity: "patient", .. }));

    let err = fx
        .records
        .mappings
        .create(alice, MappingInput::new(john.id, lee.id + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, RecordsError::NotFound { entity: "doctor", .. }));

    let body = serde_json::from_value(json!({"patient": "one", "doctor": null})).unwrap();
    let err = fx.records.mappings.create(alice, body).await.unwrap_err();
    let RecordsError::Validation { errors } = err else {
        panic!("expected validation error");
    };
    assert_eq!(
        errors.get("patient"),
        ["Incorrect type. Expected pk value, received str.".to_string()]
    );
    assert!(errors.contains("doctor"));

    let mapping = fx
        .records
        .mappings
        .create(alice, MappingInput::new(john.id, lee.id))
        .await
        .unwrap();
    assert!(fx.records.mappings.list(bob).await.unwrap().is_empty());
    let err = fx.records.mappings.delete(bob, mapping.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = fx
        .records
        .mappings
        .doctors_for_patient(bob, john.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assignments_produce_one_mapping() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;
    let john = fx.records.patients.create(alice, john()).await.unwrap();
    let lee = fx.records.doctors.create(lee()).await.unwrap();

    let (patient_id, doctor_id) = (john.id, lee.id);

    let attempts = (0..12).map(|_| {
        let mappings = fx.records.mappings.clone();
        tokio::spawn(async move {
            mappings
                .create(alice, MappingInput::new(patient_id, doctor_id))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, RecordsError::AlreadyAssigned { .. }))
    );
    assert_eq!(fx.records.mappings.list(alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn lists_are_newest_first() {
    let fx = Fixture::new();
    let alice = fx.principal("alice@x.com").await;
    let first = fx.records.patients.create(alice, john()).await.unwrap();
    let second = fx
        .records
        .patients
        .create(alice, patient(json!({"name": "Jane", "age": 30, "gender": "female"})))
        .await
        .unwrap();

    let ids: Vec<_> = fx
        .records
        .patients
        .list(alice)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
