//! Axum integration: shared auth state, the session gate and error
//! responses.

mod error;
mod gate;

pub use gate::{AuthState, SessionContext, extract_token, require_session};
