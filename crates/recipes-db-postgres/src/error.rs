use recipes_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// SQLSTATE `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

pub fn is_unique_violation(err: &SqlxError) -> bool {
    matches!(err, SqlxError::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Failures while setting up the backend. Query failures are mapped
/// straight to [`StorageError`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => sqlx_to_storage(e),
            PostgresError::Migration(e) => StorageError::internal(format!("Migration error: {e}")),
        }
    }
}

/// Pool exhaustion and transport failures are connection errors; the
/// rest are internal.
pub(crate) fn sqlx_to_storage(err: SqlxError) -> StorageError {
    match err {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_) => {
            StorageError::connection_error(err.to_string())
        }
        other => StorageError::internal(other.to_string()),
    }
}

pub type Result<T> = std::result::Result<T, PostgresError>;
