//! `/signin`, `/refresh` and `/signout` handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use recipes_api::MessageResponse;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::manager::IssuedSession;
use crate::middleware::{AuthState, extract_token};

/// Sign-in request body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Optional body for `/refresh` and `/signout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Returned by `/signin` and `/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl From<&IssuedSession> for TokenResponse {
    fn from(issued: &IssuedSession) -> Self {
        Self {
            token: issued.token.clone(),
            expires_at: issued.session.expires_at,
        }
    }
}

fn session_cookie(config: &CookieConfig, issued: &IssuedSession) -> Cookie<'static> {
    let max_age = issued.session.expires_at - issued.session.issued_at;
    Cookie::build((config.name.clone(), issued.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.secure)
        .max_age(max_age)
        .build()
}

fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), "")).path("/").build()
}

/// Token from the JSON body if present, otherwise from the
/// `Authorization` header or session cookie.
fn token_from_request(
    headers: &HeaderMap,
    body: &Bytes,
    cookie: &CookieConfig,
) -> Result<Option<String>, AuthError> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        let request: TokenRequest = serde_json::from_slice(body)
            .map_err(|e| AuthError::invalid_request(format!("invalid request body: {e}")))?;
        if let Some(token) = request.token.filter(|t| !t.trim().is_empty()) {
            return Ok(Some(token));
        }
    }
    Ok(extract_token(headers, &cookie.name))
}

/// `POST /signin`
pub async fn sign_in(
    State(auth): State<AuthState>,
    jar: CookieJar,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::invalid_request(e.body_text()))?;
    let issued = auth
        .manager
        .sign_in(&request.username, &request.password)
        .await?;
    let jar = jar.add(session_cookie(&auth.cookie, &issued));
    Ok((jar, Json(TokenResponse::from(&issued))))
}

/// `POST /refresh`
pub async fn refresh(
    State(auth): State<AuthState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    let token = token_from_request(&headers, &body, &auth.cookie)?.ok_or(AuthError::MissingToken)?;
    let issued = auth.manager.refresh(&token).await?;
    let jar = jar.add(session_cookie(&auth.cookie, &issued));
    Ok((jar, Json(TokenResponse::from(&issued))))
}

/// `POST /signout`. Always answers 200 unless the session store fails.
pub async fn sign_out(
    State(auth): State<AuthState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(CookieJar, MessageResponse), AuthError> {
    let token = match token_from_request(&headers, &body, &auth.cookie) {
        Ok(token) => token,
        Err(_) => extract_token(&headers, &auth.cookie.name),
    };
    if let Some(token) = token {
        auth.manager.sign_out(&token).await?;
    }
    let jar = jar.remove(removal_cookie(&auth.cookie));
    Ok((jar, MessageResponse::new("Signed out")))
}
