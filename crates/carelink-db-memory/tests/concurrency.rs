use std::sync::Arc;

use carelink_auth::{CredentialStore, NewPrincipal};
use carelink_db_memory::InMemoryStorage;
use carelink_storage::{ClinicStorage, Gender, MappingTarget, NewDoctor, NewPatient, constraints};
use futures_util::future::join_all;
use time::OffsetDateTime;

async fn seed(storage: &InMemoryStorage) -> (i64, i64, i64) {
    let now = OffsetDateTime::now_utc();
    let owner = storage
        .save(NewPrincipal::active("a@x.com", "Alice", "hash".into()), now)
        .await
        .expect("save principal");
    let patient = storage
        .insert_patient(
            NewPatient {
                owner_id: owner.id,
                name: "John".into(),
                age: 45,
                gender: Gender::Male,
                address: String::new(),
            },
            now,
        )
        .await
        .expect("insert patient");
    let doctor = storage
        .insert_doctor(
            NewDoctor {
                name: "Dr. Lee".into(),
                specialization: "Cardiology".into(),
            },
            now,
        )
        .await
        .expect("insert doctor");
    (owner.id, patient.id, doctor.id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mapping_inserts_admit_exactly_one() {
    let storage = InMemoryStorage::shared();
    let (owner, patient, doctor) = seed(&storage).await;

    let tasks = (0..16).map(|_| {
        let storage = Arc::clone(&storage);
        tokio::spawn(async move {
            storage
                .insert_mapping(patient, doctor, OffsetDateTime::now_utc())
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(err.is_unique_violation_of(constraints::UNIQ_PATIENT_DOCTOR));
    }
    assert_eq!(storage.list_mappings(owner).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_with_same_email_admit_exactly_one() {
    let storage = InMemoryStorage::shared();
    let now = OffsetDateTime::now_utc();

    let tasks = (0..8).map(|i| {
        let storage = Arc::clone(&storage);
        tokio::spawn(async move {
            storage
                .save(
                    NewPrincipal::active("same@x.com", format!("User {i}"), "hash".into()),
                    now,
                )
                .await
        })
    });
    let results = join_all(tasks).await;

    let successes = results
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_racing_mapping_insert_never_leaves_dangling_mapping() {
    for _ in 0..20 {
        let storage = InMemoryStorage::shared();
        let (_, patient, doctor) = seed(&storage).await;

        let inserter = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                storage
                    .insert_mapping(patient, doctor, OffsetDateTime::now_utc())
                    .await
            })
        };
        let deleter = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move { storage.delete_doctor(doctor).await })
        };

        let inserted = inserter.await.expect("task panicked");
        let deleted = deleter.await.expect("task panicked");

        // Exactly one side wins; the loser sees a foreign-key violation.
        match (inserted, deleted) {
            (Ok(_), Err(err)) => {
                assert!(err.is_foreign_key_violation());
                assert!(storage.find_doctor(doctor).await.unwrap().is_some());
            }
            (Err(err), Ok(true)) => {
                assert_eq!(err.constraint(), Some(constraints::MAPPING_DOCTOR_FK));
                assert!(
                    !storage
                        .has_mappings(MappingTarget::Doctor(doctor))
                        .await
                        .unwrap()
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
