//! Session authentication for the recipes server.
//!
//! Users sign in with a username and password and receive an opaque
//! session token. The token can be exchanged for a fresh one (refresh)
//! or revoked (sign out). Write routes are protected by the
//! [`middleware::require_session`] gate.
//!
//! # Session lifecycle
//!
//! ```text
//! sign_in ──► Active ──refresh──► Revoked(Refreshed) + new Active
//!               │
//!               ├──sign_in───► Revoked(Superseded) + new Active
//!               ├──sign_out──► Revoked(SignedOut)
//!               └──time──────► Expired
//! ```
//!
//! A user holds at most one active session: signing in again revokes
//! the previous one.
//!
//! Only a SHA-256 hash of each token is stored, so a leaked session
//! table cannot be replayed.

pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod middleware;
pub mod password;
pub mod storage;
pub mod types;

pub use config::{CookieConfig, SessionConfig};
pub use error::AuthError;
pub use manager::{IssuedSession, SessionManager};
pub use middleware::{AuthState, SessionContext};
pub use types::{RevocationReason, Session, SessionState, SessionStatus, User};

/// Result type alias for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
