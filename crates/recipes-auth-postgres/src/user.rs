//! User storage.

use async_trait::async_trait;
use recipes_auth::storage::UserStorage;
use recipes_auth::{AuthResult, User};
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{PgPool, StorageError};

type UserTuple = (Uuid, String, String, OffsetDateTime);

fn from_tuple(row: UserTuple) -> User {
    User {
        id: row.0,
        username: row.1,
        password_hash: row.2,
        created_at: row.3,
    }
}

/// PostgreSQL-backed [`UserStorage`].
#[derive(Debug, Clone)]
pub struct PostgresUserStorage {
    pool: PgPool,
}

impl PostgresUserStorage {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for PostgresUserStorage {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, username, password_hash, created_at
            FROM app_user
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(row.map(from_tuple))
    }

    async fn upsert(&self, user: &User) -> AuthResult<User> {
        let row: UserTuple = query_as(
            r#"
            INSERT INTO app_user (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(from_tuple(row))
    }
}
