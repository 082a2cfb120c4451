//! Error types for the PostgreSQL storage backend.

use carelink_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for unique violation (23505).
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL error code for foreign key violation (23503).
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL error code for check violation (23514).
pub const PG_CHECK_VIOLATION: &str = "23514";

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx_core::error::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => StorageError::connection_error(e.to_string()),
            PostgresError::Migration(e) => StorageError::internal(format!("Migration error: {e}")),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Translates a query failure into a `StorageError`.
///
/// Constraint violations keep the violated constraint's name so callers can
/// tell which invariant was hit.
pub fn map_sqlx_error(err: SqlxError) -> StorageError {
    if let SqlxError::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        match db_err.code().as_deref() {
            Some(PG_UNIQUE_VIOLATION) => return StorageError::unique_violation(constraint),
            Some(PG_FOREIGN_KEY_VIOLATION) => {
                return StorageError::foreign_key_violation(constraint);
            }
            Some(PG_CHECK_VIOLATION) => {
                return StorageError::invalid_record(format!("check {constraint} failed"));
            }
            _ => {}
        }
    }

    match err {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
            StorageError::connection_error(err.to_string())
        }
        other => StorageError::internal(other.to_string()),
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostgresError::config("invalid URL");
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_conversion_to_storage_error() {
        let pg_err = PostgresError::config("test error");
        let storage_err: StorageError = pg_err.into();
        assert!(matches!(storage_err, StorageError::Internal { .. }));

        let pg_err = PostgresError::Migration("boom".into());
        let storage_err: StorageError = pg_err.into();
        assert!(storage_err.to_string().contains("boom"));
    }

    #[test]
    fn test_pool_errors_are_connection_errors() {
        let err = map_sqlx_error(SqlxError::PoolTimedOut);
        assert!(matches!(err, StorageError::ConnectionError { .. }));

        let err = map_sqlx_error(SqlxError::RowNotFound);
        assert!(matches!(err, StorageError::Internal { .. }));
    }
}
