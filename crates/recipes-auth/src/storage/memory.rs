use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::storage::{SessionStorage, UserStorage};
use crate::types::{RevocationReason, Session, SessionState, User};

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn active_at(&self, now: OffsetDateTime) -> usize {
        self.sessions.iter().filter(|s| s.is_active_at(now)).count()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.get(token_hash).map(|s| s.value().clone()))
    }

    async fn revoke_active(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<Option<Session>> {
        // get_mut holds the shard write lock, so check and revoke are atomic.
        let Some(mut entry) = self.sessions.get_mut(token_hash) else {
            return Ok(None);
        };
        if !entry.is_active_at(now) {
            return Ok(None);
        }
        entry.revoke(reason, now);
        Ok(Some(entry.value().clone()))
    }

    async fn revoke(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<bool> {
        match self.sessions.get_mut(token_hash) {
            Some(mut entry) => {
                entry.revoke(reason, now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        keep: Uuid,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<u64> {
        let mut revoked = 0;
        for mut entry in self.sessions.iter_mut() {
            if entry.user_id == user_id && entry.id != keep && entry.state == SessionState::Active
            {
                entry.revoke(reason, now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at >= now);
        Ok((before.saturating_sub(self.sessions.len())) as u64)
    }

    async fn count(&self) -> AuthResult<u64> {
        Ok(self.sessions.len() as u64)
    }
}

/// Process-local user storage.
#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: DashMap<String, User>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self.users.get(username).map(|u| u.value().clone()))
    }

    async fn upsert(&self, user: &User) -> AuthResult<User> {
        let stored = self
            .users
            .entry(user.username.clone())
            .and_modify(|existing| existing.password_hash = user.password_hash.clone())
            .or_insert_with(|| user.clone())
            .value()
            .clone();
        Ok(stored)
    }
}
