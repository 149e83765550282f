//! Session gate for protected routes.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::post};
//! use recipes_auth::middleware::{AuthState, require_session};
//!
//! let app = Router::new()
//!     .route("/recipes", post(create_recipe))
//!     .route_layer(middleware::from_fn_with_state(auth_state, require_session));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::manager::SessionManager;
use crate::types::Session;

/// State required by the gate and the auth handlers.
///
/// Include it in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    pub manager: Arc<SessionManager>,
    pub cookie: CookieConfig,
}

impl AuthState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        let cookie = manager.config().cookie.clone();
        Self { manager, cookie }
    }
}

/// The authenticated session, inserted into request extensions by
/// [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: OffsetDateTime,
}

impl From<&Session> for SessionContext {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            user_id: session.user_id,
            username: session.username.clone(),
            expires_at: session.expires_at,
        }
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Finds the session token: `Authorization: Bearer` first, then the
/// session cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let jar = CookieJar::from_headers(headers);
    let token = jar
        .get(cookie_name)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty());
    if token.is_some() {
        tracing::debug!(cookie_name = %cookie_name, "token extracted from cookie");
    }
    token
}

/// Middleware that rejects the request unless it carries a token for an
/// active session. The downstream handler never runs on rejection.
pub async fn require_session(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(req.headers(), &auth.cookie.name).ok_or_else(|| {
        tracing::debug!(path = %req.uri().path(), "request without session token");
        AuthError::MissingToken
    })?;

    let session = auth.manager.authenticate(&token).await.inspect_err(|e| {
        if e.is_authentication_error() {
            tracing::debug!(error = %e, "session rejected");
        }
    })?;

    req.extensions_mut().insert(SessionContext::from(&session));
    Ok(next.run(req).await)
}
