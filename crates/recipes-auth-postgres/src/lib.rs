//! PostgreSQL storage backend for recipes-auth.
//!
//! Provides persistent storage for:
//!
//! - Users (`app_user` table)
//! - Sessions (`auth_session` table)
//!
//! The tables are created by the `recipes-db-postgres` migrations; this
//! crate shares that pool.
//!
//! # Example
//!
//! ```ignore
//! use recipes_auth_postgres::{PostgresSessionStorage, PostgresUserStorage};
//!
//! let sessions = PostgresSessionStorage::new(pool.clone());
//! let users = PostgresUserStorage::new(pool);
//! ```

pub mod session;
pub mod user;

use recipes_auth::AuthError;
use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use session::PostgresSessionStorage;
pub use user::PostgresUserStorage;

/// Errors that can occur during auth storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// A stored row could not be turned into a domain value.
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl StorageError {
    /// Creates an invalid row error.
    #[must_use]
    pub fn invalid_row(msg: impl Into<String>) -> Self {
        Self::InvalidRow(msg.into())
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::storage(err.to_string())
    }
}

/// Result type for auth storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_auth_storage_error() {
        let err: AuthError = StorageError::invalid_row("bad reason").into();
        assert!(err.is_server_error());
        assert!(matches!(err, AuthError::Storage { .. }));
    }
}
