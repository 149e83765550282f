//! Session and user records.

pub mod session;
pub mod user;

pub use session::{RevocationReason, Session, SessionState, SessionStatus};
pub use user::User;
