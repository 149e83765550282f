//! Session record and its state machine.
//!
//! # Security
//!
//! - The bearer token is never stored, only its SHA-256 hash
//! - [`Session::status_at`] is the only place validity is decided

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Why a session stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// The client signed out.
    SignedOut,
    /// The token was exchanged for a new one.
    Refreshed,
    /// A newer session for the same user replaced it.
    Superseded,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignedOut => "signed_out",
            Self::Refreshed => "refreshed",
            Self::Superseded => "superseded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "signed_out" => Some(Self::SignedOut),
            "refreshed" => Some(Self::Refreshed),
            "superseded" => Some(Self::Superseded),
            _ => None,
        }
    }
}

/// Stored session state. Expiry is not a stored state; it is derived
/// from `expires_at` by [`Session::status_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Revoked {
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
        reason: RevocationReason,
    },
}

/// Effective status of a session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Revoked(RevocationReason),
    Expired,
}

/// A server-side session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    /// SHA-256 hash (hex) of the bearer token.
    pub token_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub state: SessionState,
}

impl Session {
    /// Creates a new active session and returns it with the plaintext
    /// token. The token is handed to the client and then forgotten.
    pub fn issue(
        user_id: Uuid,
        username: impl Into<String>,
        ttl: Duration,
        issued_at: OffsetDateTime,
    ) -> (String, Self) {
        let token = generate_token();
        let session = Self {
            id: Uuid::new_v4(),
            user_id,
            username: username.into(),
            token_hash: hash_token(&token),
            issued_at,
            expires_at: issued_at.saturating_add(ttl),
            state: SessionState::Active,
        };
        (token, session)
    }

    /// Effective status at `now`. Revocation wins over expiry.
    #[must_use]
    pub fn status_at(&self, now: OffsetDateTime) -> SessionStatus {
        match self.state {
            SessionState::Revoked { reason, .. } => SessionStatus::Revoked(reason),
            SessionState::Active if now >= self.expires_at => SessionStatus::Expired,
            SessionState::Active => SessionStatus::Active,
        }
    }

    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.status_at(now) == SessionStatus::Active
    }

    /// Marks the session revoked. Already-revoked sessions keep their
    /// first revocation time and reason.
    pub fn revoke(&mut self, reason: RevocationReason, at: OffsetDateTime) {
        if self.state == SessionState::Active {
            self.state = SessionState::Revoked { at, reason };
        }
    }
}

/// Hash a token value using SHA-256, hex encoded.
#[must_use]
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a 256-bit random token encoded as base64url (43 characters).
#[must_use]
pub fn generate_token() -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
