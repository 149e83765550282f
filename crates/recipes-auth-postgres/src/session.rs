//! Session storage.
//!
//! Revocation is a column update (`revoked_at`, `revoke_reason`); the
//! refresh path relies on a conditional `UPDATE ... RETURNING` so only
//! one caller can consume an active session.

use async_trait::async_trait;
use recipes_auth::storage::SessionStorage;
use recipes_auth::{AuthResult, RevocationReason, Session, SessionState};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{PgPool, StorageError, StorageResult};

const SESSION_COLUMNS: &str =
    "id, user_id, username, token_hash, issued_at, expires_at, revoked_at, revoke_reason";

type SessionTuple = (
    Uuid,
    Uuid,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<String>,
);

fn from_tuple(row: SessionTuple) -> StorageResult<Session> {
    let state = match (row.6, row.7) {
        (None, _) => SessionState::Active,
        (Some(at), Some(reason)) => SessionState::Revoked {
            at,
            reason: RevocationReason::parse(&reason)
                .ok_or_else(|| StorageError::invalid_row(format!("unknown revoke reason: {reason}")))?,
        },
        (Some(_), None) => {
            return Err(StorageError::invalid_row("revoked session without a reason"));
        }
    };
    Ok(Session {
        id: row.0,
        user_id: row.1,
        username: row.2,
        token_hash: row.3,
        issued_at: row.4,
        expires_at: row.5,
        state,
    })
}

/// PostgreSQL-backed [`SessionStorage`].
#[derive(Debug, Clone)]
pub struct PostgresSessionStorage {
    pool: PgPool,
}

impl PostgresSessionStorage {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStorage for PostgresSessionStorage {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        let (revoked_at, reason) = match session.state {
            SessionState::Active => (None, None),
            SessionState::Revoked { at, reason } => (Some(at), Some(reason.as_str())),
        };

        query(
            r#"
            INSERT INTO auth_session
                (id, user_id, username, token_hash, issued_at, expires_at, revoked_at, revoke_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.username)
        .bind(&session.token_hash)
        .bind(session.issued_at)
        .bind(session.expires_at)
        .bind(revoked_at)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AuthResult<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM auth_session WHERE token_hash = $1");
        let row: Option<SessionTuple> = query_as(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(from_tuple).transpose()?)
    }

    async fn revoke_active(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<Option<Session>> {
        let sql = format!(
            r#"
            UPDATE auth_session
            SET revoked_at = $3, revoke_reason = $2
            WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > $3
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let row: Option<SessionTuple> = query_as(&sql)
            .bind(token_hash)
            .bind(reason.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(from_tuple).transpose()?)
    }

    async fn revoke(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<bool> {
        let result = query(
            r#"
            UPDATE auth_session
            SET revoked_at = COALESCE(revoked_at, $3),
                revoke_reason = COALESCE(revoke_reason, $2)
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .bind(reason.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        keep: Uuid,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<u64> {
        let result = query(
            r#"
            UPDATE auth_session
            SET revoked_at = $4, revoke_reason = $3
            WHERE user_id = $1 AND id <> $2 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(keep)
        .bind(reason.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let result = query("DELETE FROM auth_session WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        debug!(deleted = result.rows_affected(), "expired sessions deleted");
        Ok(result.rows_affected())
    }

    async fn count(&self) -> AuthResult<u64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM auth_session")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(revoked_at: Option<OffsetDateTime>, reason: Option<&str>) -> SessionTuple {
        let now = OffsetDateTime::now_utc();
        (
            Uuid::new_v4(),
            Uuid::new_v4(),
            "admin".into(),
            "hash".into(),
            now,
            now + time::Duration::hours(1),
            revoked_at,
            reason.map(str::to_string),
        )
    }

    #[test]
    fn test_row_states() {
        let active = from_tuple(tuple(None, None)).unwrap();
        assert_eq!(active.state, SessionState::Active);

        let at = OffsetDateTime::now_utc();
        let revoked = from_tuple(tuple(Some(at), Some("refreshed"))).unwrap();
        assert_eq!(
            revoked.state,
            SessionState::Revoked {
                at,
                reason: RevocationReason::Refreshed
            }
        );

        assert!(from_tuple(tuple(Some(at), Some("bogus"))).is_err());
        assert!(from_tuple(tuple(Some(at), None)).is_err());
    }
}
