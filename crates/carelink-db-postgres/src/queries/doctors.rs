//! Doctor queries.

use carelink_core::RecordId;
use carelink_storage::{Doctor, DoctorChanges, NewDoctor, StorageError};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;

use super::NEWEST_FIRST;
use crate::error::map_sqlx_error;

const COLUMNS: &str = "id, name, specialization, created_at, updated_at";

pub(crate) type DoctorRow = (i64, String, String, OffsetDateTime, OffsetDateTime);

pub(crate) fn from_row(row: DoctorRow) -> Doctor {
    let (id, name, specialization, created_at, updated_at) = row;
    Doctor {
        id,
        name,
        specialization,
        created_at,
        updated_at,
    }
}

pub async fn insert(
    pool: &PgPool,
    doctor: NewDoctor,
    at: OffsetDateTime,
) -> Result<Doctor, StorageError> {
    let sql = format!(
        "INSERT INTO doctor (name, specialization, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         RETURNING {COLUMNS}"
    );
    let row: DoctorRow = query_as(&sql)
        .bind(&doctor.name)
        .bind(&doctor.specialization)
        .bind(at)
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(from_row(row))
}

pub async fn list(pool: &PgPool) -> Result<Vec<Doctor>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM doctor {NEWEST_FIRST}");
    let rows: Vec<DoctorRow> = query_as(&sql)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_row).collect())
}

pub async fn find(pool: &PgPool, id: RecordId) -> Result<Option<Doctor>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM doctor WHERE id = $1");
    let row: Option<DoctorRow> = query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.map(from_row))
}

pub async fn update(
    pool: &PgPool,
    id: RecordId,
    changes: DoctorChanges,
    at: OffsetDateTime,
) -> Result<Option<Doctor>, StorageError> {
    let sql = format!(
        "UPDATE doctor
         SET name = COALESCE($2, name),
             specialization = COALESCE($3, specialization),
             updated_at = $4
         WHERE id = $1
         RETURNING {COLUMNS}"
    );
    let row: Option<DoctorRow> = query_as(&sql)
        .bind(id)
        .bind(changes.name)
        .bind(changes.specialization)
        .bind(at)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.map(from_row))
}

/// Deletes the row; a referencing mapping makes the statement fail with
/// `mapping_doctor_fk`.
pub async fn delete(pool: &PgPool, id: RecordId) -> Result<bool, StorageError> {
    let result = query("DELETE FROM doctor WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() > 0)
}
