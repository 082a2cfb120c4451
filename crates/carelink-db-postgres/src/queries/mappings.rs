//! Mapping queries. Ownership follows the mapped patient.

use carelink_core::{PrincipalId, RecordId};
use carelink_storage::{Doctor, Mapping, MappingTarget, StorageError};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;

use super::doctors::{self, DoctorRow};
use crate::error::map_sqlx_error;

type MappingRow = (i64, i64, i64, OffsetDateTime, OffsetDateTime);

fn from_row(row: MappingRow) -> Mapping {
    let (id, patient_id, doctor_id, created_at, updated_at) = row;
    Mapping {
        id,
        patient_id,
        doctor_id,
        created_at,
        updated_at,
    }
}

/// Inserts the pair. The schema rejects duplicates with
/// `uniq_patient_doctor` and dangling ids with the mapping foreign keys.
pub async fn insert(
    pool: &PgPool,
    patient_id: RecordId,
    doctor_id: RecordId,
    at: OffsetDateTime,
) -> Result<Mapping, StorageError> {
    let row: MappingRow = query_as(
        "INSERT INTO mapping (patient_id, doctor_id, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         RETURNING id, patient_id, doctor_id, created_at, updated_at",
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(at)
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(from_row(row))
}

pub async fn exists(
    pool: &PgPool,
    patient_id: RecordId,
    doctor_id: RecordId,
) -> Result<bool, StorageError> {
    query_scalar("SELECT EXISTS (SELECT 1 FROM mapping WHERE patient_id = $1 AND doctor_id = $2)")
        .bind(patient_id)
        .bind(doctor_id)
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)
}

pub async fn list(pool: &PgPool, owner: PrincipalId) -> Result<Vec<Mapping>, StorageError> {
    let rows: Vec<MappingRow> = query_as(
        "SELECT m.id, m.patient_id, m.doctor_id, m.created_at, m.updated_at
         FROM mapping m
         JOIN patient p ON p.id = m.patient_id
         WHERE p.owner_id = $1
         ORDER BY m.created_at DESC, m.id DESC",
    )
    .bind(owner)
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_row).collect())
}

pub async fn find(
    pool: &PgPool,
    owner: PrincipalId,
    id: RecordId,
) -> Result<Option<Mapping>, StorageError> {
    let row: Option<MappingRow> = query_as(
        "SELECT m.id, m.patient_id, m.doctor_id, m.created_at, m.updated_at
         FROM mapping m
         JOIN patient p ON p.id = m.patient_id
         WHERE m.id = $1 AND p.owner_id = $2",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(row.map(from_row))
}

pub async fn delete(pool: &PgPool, owner: PrincipalId, id: RecordId) -> Result<bool, StorageError> {
    let result = query(
        "DELETE FROM mapping m
         USING patient p
         WHERE m.id = $1 AND p.id = m.patient_id AND p.owner_id = $2",
    )
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() > 0)
}

/// Doctors mapped to the patient, most recently assigned first.
pub async fn doctors_for_patient(
    pool: &PgPool,
    patient_id: RecordId,
) -> Result<Vec<Doctor>, StorageError> {
    let sql = format!(
        "SELECT {columns}
         FROM mapping m
         JOIN doctor d ON d.id = m.doctor_id
         WHERE m.patient_id = $1
         ORDER BY m.created_at DESC, m.id DESC",
        columns = "d.id, d.name, d.specialization, d.created_at, d.updated_at",
    );
    let rows: Vec<DoctorRow> = query_as(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(doctors::from_row).collect())
}

pub async fn references(pool: &PgPool, target: MappingTarget) -> Result<bool, StorageError> {
    let sql = match target {
        MappingTarget::Patient(_) => "SELECT EXISTS (SELECT 1 FROM mapping WHERE patient_id = $1)",
        MappingTarget::Doctor(_) => "SELECT EXISTS (SELECT 1 FROM mapping WHERE doctor_id = $1)",
    };
    query_scalar(sql)
        .bind(target.id())
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)
}
