//! Patient queries. Every statement filters on `owner_id`.

use carelink_core::{PrincipalId, RecordId};
use carelink_storage::{Gender, NewPatient, Patient, PatientChanges, StorageError};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;

use super::{NEWEST_FIRST, age_from_db, age_to_db};
use crate::error::map_sqlx_error;

const COLUMNS: &str = "id, owner_id, name, age, gender, address, created_at, updated_at";

type PatientRow = (
    i64,
    i64,
    String,
    i32,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
);

fn from_row(row: PatientRow) -> Result<Patient, StorageError> {
    let (id, owner_id, name, age, gender, address, created_at, updated_at) = row;
    let gender: Gender = gender
        .parse()
        .map_err(|e: carelink_storage::UnknownGender| StorageError::invalid_record(e.to_string()))?;
    Ok(Patient {
        id,
        owner_id,
        name,
        age: age_from_db(age)?,
        gender,
        address,
        created_at,
        updated_at,
    })
}

pub async fn insert(
    pool: &PgPool,
    patient: NewPatient,
    at: OffsetDateTime,
) -> Result<Patient, StorageError> {
    let sql = format!(
        "INSERT INTO patient (owner_id, name, age, gender, address, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         RETURNING {COLUMNS}"
    );
    let row: PatientRow = query_as(&sql)
        .bind(patient.owner_id)
        .bind(&patient.name)
        .bind(age_to_db(patient.age)?)
        .bind(patient.gender.as_str())
        .bind(&patient.address)
        .bind(at)
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;
    from_row(row)
}

pub async fn list(pool: &PgPool, owner: PrincipalId) -> Result<Vec<Patient>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM patient WHERE owner_id = $1 {NEWEST_FIRST}");
    let rows: Vec<PatientRow> = query_as(&sql)
        .bind(owner)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    rows.into_iter().map(from_row).collect()
}

pub async fn find(
    pool: &PgPool,
    owner: PrincipalId,
    id: RecordId,
) -> Result<Option<Patient>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM patient WHERE id = $1 AND owner_id = $2");
    let row: Option<PatientRow> = query_as(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_row).transpose()
}

/// Applies `changes` in one statement; absent fields keep their value.
pub async fn update(
    pool: &PgPool,
    owner: PrincipalId,
    id: RecordId,
    changes: PatientChanges,
    at: OffsetDateTime,
) -> Result<Option<Patient>, StorageError> {
    let sql = format!(
        "UPDATE patient
         SET name = COALESCE($3, name),
             age = COALESCE($4, age),
             gender = COALESCE($5, gender),
             address = COALESCE($6, address),
             updated_at = $7
         WHERE id = $1 AND owner_id = $2
         RETURNING {COLUMNS}"
    );
    let age = changes.age.map(age_to_db).transpose()?;
    let row: Option<PatientRow> = query_as(&sql)
        .bind(id)
        .bind(owner)
        .bind(changes.name)
        .bind(age)
        .bind(changes.gender.map(Gender::as_str))
        .bind(changes.address)
        .bind(at)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_row).transpose()
}

/// Deletes the row; a referencing mapping makes the statement fail with
/// `mapping_patient_fk`.
pub async fn delete(pool: &PgPool, owner: PrincipalId, id: RecordId) -> Result<bool, StorageError> {
    let result = query("DELETE FROM patient WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() > 0)
}
