//! Session lifecycle: sign-in, refresh, sign-out and the request gate.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::storage::{SessionStorage, UserStorage};
use crate::types::session::{generate_token, hash_token};
use crate::types::{RevocationReason, Session, SessionStatus};
use crate::AuthResult;

/// A freshly issued session together with the token to hand to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// Owns the session state machine.
///
/// All transitions go through this type; storage implementations only
/// persist records and perform the atomic revoke used by refresh.
pub struct SessionManager {
    sessions: Arc<dyn SessionStorage>,
    users: Arc<dyn UserStorage>,
    config: SessionConfig,
    /// Verified against when the username is unknown, so both paths
    /// cost one Argon2 verification.
    dummy_hash: String,
}

impl SessionManager {
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the config is invalid.
    pub fn new(
        sessions: Arc<dyn SessionStorage>,
        users: Arc<dyn UserStorage>,
        config: SessionConfig,
    ) -> AuthResult<Self> {
        config.validate().map_err(AuthError::configuration)?;
        let dummy_hash = hash_password(&generate_token())
            .map_err(|e| AuthError::internal(format!("failed to prepare password hasher: {e}")))?;
        Ok(Self {
            sessions,
            users,
            config,
            dummy_hash,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn users(&self) -> &Arc<dyn UserStorage> {
        &self.users
    }

    /// Verifies the credentials and opens a new active session. Any other
    /// session the user still holds is revoked as `Superseded`.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` for an unknown user or wrong
    /// password (no session is created); `AuthError::Storage` if the
    /// user or session store fails.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, username: &str, password: &str) -> AuthResult<IssuedSession> {
        let user = self.users.find_by_username(username).await?;

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::internal(format!("password verification task failed: {e}")))?
            .map_err(|e| AuthError::internal(format!("stored password hash is invalid: {e}")))?;

        match user {
            Some(user) if verified => {
                let issued = self.open_session(user.id, &user.username).await?;
                let superseded = self
                    .sessions
                    .revoke_all_for_user(
                        user.id,
                        issued.session.id,
                        RevocationReason::Superseded,
                        issued.session.issued_at,
                    )
                    .await;
                match superseded {
                    Ok(count) => {
                        if count > 0 {
                            debug!(count, "previous sessions revoked");
                        }
                        Ok(issued)
                    }
                    Err(e) => {
                        self.discard(&issued).await;
                        Err(e)
                    }
                }
            }
            _ => {
                debug!("sign-in rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Exchanges an active token for a new one.
    ///
    /// The replacement is stored first and the old session consumed
    /// second, so a failed write leaves the old token usable. Of several
    /// concurrent refreshes of one token exactly one wins; the losers'
    /// replacements are revoked before they are returned.
    ///
    /// # Errors
    ///
    /// `TokenExpired`, `TokenRevoked` or `InvalidToken` when the token
    /// cannot be refreshed; `Storage` on store failure.
    #[instrument(skip_all)]
    pub async fn refresh(&self, token: &str) -> AuthResult<IssuedSession> {
        let token_hash = hash_token(token);
        let now = OffsetDateTime::now_utc();

        let current = match self.sessions.find_by_token_hash(&token_hash).await? {
            Some(session) if session.is_active_at(now) => session,
            _ => return Err(self.rejection(&token_hash, now).await?),
        };

        let issued = self.open_session(current.user_id, &current.username).await?;
        match self
            .sessions
            .revoke_active(&token_hash, RevocationReason::Refreshed, now)
            .await
        {
            Ok(Some(old)) => {
                debug!(session_id = %old.id, "session refreshed");
                Ok(issued)
            }
            Ok(None) => {
                self.discard(&issued).await;
                Err(self.rejection(&token_hash, now).await?)
            }
            Err(e) => {
                self.discard(&issued).await;
                Err(e)
            }
        }
    }

    /// Revokes the session behind `token`. Unknown or already revoked
    /// tokens are not an error.
    ///
    /// # Errors
    ///
    /// Only `AuthError::Storage` on store failure.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, token: &str) -> AuthResult<()> {
        let existed = self
            .sessions
            .revoke(
                &hash_token(token),
                RevocationReason::SignedOut,
                OffsetDateTime::now_utc(),
            )
            .await?;
        debug!(existed, "sign-out processed");
        Ok(())
    }

    /// The gate: succeeds only for an active, unexpired session.
    ///
    /// # Errors
    ///
    /// An authentication error naming why the token was refused, or
    /// `Storage` on store failure.
    pub async fn authenticate(&self, token: &str) -> AuthResult<Session> {
        let token_hash = hash_token(token);
        let now = OffsetDateTime::now_utc();
        let session = self
            .sessions
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AuthError::invalid_token("unknown session token"))?;

        match session.status_at(now) {
            SessionStatus::Active => Ok(session),
            SessionStatus::Expired => Err(AuthError::TokenExpired),
            SessionStatus::Revoked(_) => Err(AuthError::TokenRevoked),
        }
    }

    /// Deletes expired session records.
    ///
    /// # Errors
    ///
    /// `AuthError::Storage` on store failure.
    pub async fn purge_expired(&self) -> AuthResult<u64> {
        let purged = self
            .sessions
            .delete_expired(OffsetDateTime::now_utc())
            .await?;
        if purged > 0 {
            info!(purged, "expired sessions purged");
        }
        Ok(purged)
    }

    async fn open_session(&self, user_id: uuid::Uuid, username: &str) -> AuthResult<IssuedSession> {
        let (token, session) =
            Session::issue(user_id, username, self.config.ttl(), OffsetDateTime::now_utc());
        self.sessions.create(&session).await?;
        info!(user = %username, session_id = %session.id, "session issued");
        Ok(IssuedSession { token, session })
    }

    /// Revokes a replacement session that will not be handed out.
    async fn discard(&self, issued: &IssuedSession) {
        if let Err(e) = self
            .sessions
            .revoke(
                &issued.session.token_hash,
                RevocationReason::Superseded,
                OffsetDateTime::now_utc(),
            )
            .await
        {
            warn!(session_id = %issued.session.id, error = %e, "failed to revoke unused session");
        }
    }

    /// Explains why a token cannot be refreshed.
    async fn rejection(&self, token_hash: &str, now: OffsetDateTime) -> AuthResult<AuthError> {
        let err = match self.sessions.find_by_token_hash(token_hash).await? {
            None => AuthError::invalid_token("unknown session token"),
            Some(session) => match session.status_at(now) {
                SessionStatus::Expired => AuthError::TokenExpired,
                SessionStatus::Revoked(_) => AuthError::TokenRevoked,
                // Lost a race with a concurrent refresh or sign-in.
                SessionStatus::Active => AuthError::TokenRevoked,
            },
        };
        debug!(error = %err, "refresh rejected");
        Ok(err)
    }
}
