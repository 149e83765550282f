//! Storage traits for sessions and users.
//!
//! Implementations live here (in-memory) and in `recipes-auth-postgres`.

mod memory;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::{RevocationReason, Session, User};

pub use memory::{InMemorySessionStorage, InMemoryUserStorage};

/// Storage for session records, keyed by token hash.
///
/// Lookups return records regardless of state; callers decide validity
/// with [`Session::status_at`].
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Stores a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn create(&self, session: &Session) -> AuthResult<()>;

    /// Finds a session by the SHA-256 hash of its token.
    async fn find_by_token_hash(&self, token_hash: &str) -> AuthResult<Option<Session>>;

    /// Atomically revokes the session if it is active and unexpired at
    /// `now`, returning the revoked record.
    ///
    /// This is a single conditional update: of several concurrent calls
    /// for the same hash, at most one gets `Some`. Returns `None` when
    /// the session is unknown, expired or already revoked.
    async fn revoke_active(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<Option<Session>>;

    /// Revokes the session if it exists and is not already revoked.
    /// Returns `true` if a record with this hash exists.
    async fn revoke(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<bool>;

    /// Revokes every non-revoked session of `user_id` except the one
    /// with id `keep`. Returns how many were revoked.
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        keep: Uuid,
        reason: RevocationReason,
        now: OffsetDateTime,
    ) -> AuthResult<u64>;

    /// Deletes records whose expiry is before `now`. Returns the count.
    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;

    /// Number of stored session records, any state.
    async fn count(&self) -> AuthResult<u64>;
}

/// Storage for user accounts.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by exact username.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Inserts the user, or replaces the password hash of an existing
    /// user with the same username.
    async fn upsert(&self, user: &User) -> AuthResult<User>;
}
