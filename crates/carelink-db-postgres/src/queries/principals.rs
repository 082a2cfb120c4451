//! Principal queries.

use carelink_auth::{NewPrincipal, Principal};
use carelink_core::PrincipalId;
use carelink_storage::StorageError;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;

type PrincipalRow = (i64, String, String, String, String, bool, OffsetDateTime);

fn from_row(row: PrincipalRow) -> Principal {
    let (id, login_id, email, name, secret_hash, is_active, created_at) = row;
    Principal {
        id,
        login_id,
        email,
        name,
        secret_hash,
        is_active,
        created_at,
    }
}

/// Exact, case-sensitive match on `login_id`.
pub async fn find_by_login_id(
    pool: &PgPool,
    login_id: &str,
) -> Result<Option<Principal>, StorageError> {
    let row: Option<PrincipalRow> = query_as(
        "SELECT id, login_id, email, name, secret_hash, is_active, created_at
         FROM principal WHERE login_id = $1",
    )
    .bind(login_id)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(row.map(from_row))
}

pub async fn find_by_id(pool: &PgPool, id: PrincipalId) -> Result<Option<Principal>, StorageError> {
    let row: Option<PrincipalRow> = query_as(
        "SELECT id, login_id, email, name, secret_hash, is_active, created_at
         FROM principal WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(row.map(from_row))
}

/// Inserts the principal; a taken login fails with `principal_login_id_key`.
pub async fn insert(
    pool: &PgPool,
    principal: NewPrincipal,
    at: OffsetDateTime,
) -> Result<Principal, StorageError> {
    let row: PrincipalRow = query_as(
        "INSERT INTO principal (login_id, email, name, secret_hash, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, login_id, email, name, secret_hash, is_active, created_at",
    )
    .bind(&principal.login_id)
    .bind(&principal.email)
    .bind(&principal.name)
    .bind(&principal.secret_hash)
    .bind(principal.is_active)
    .bind(at)
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(from_row(row))
}

/// Deletes the principal. Owned patients go with it through the cascading
/// owner key, unless a mapping still references one of them.
pub async fn delete(pool: &PgPool, id: PrincipalId) -> Result<bool, StorageError> {
    let result = query("DELETE FROM principal WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() > 0)
}
