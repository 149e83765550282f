//! HTTP mapping for `AuthError`.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use recipes_api::ApiError;

use crate::error::AuthError;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidCredentials => ApiError::unauthorized("invalid username or password"),
            AuthError::MissingToken => ApiError::unauthorized("authentication required"),
            AuthError::InvalidToken { .. } | AuthError::TokenExpired | AuthError::TokenRevoked => {
                ApiError::unauthorized("invalid or expired session")
            }
            AuthError::InvalidRequest { message } => ApiError::bad_request(message.clone()),
            AuthError::Storage { .. }
            | AuthError::Configuration { .. }
            | AuthError::Internal { .. } => ApiError::infrastructure(err.kind(), err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = ApiError::from(self).into_response();
        if response.status() == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"recipes\""),
            );
        }
        response
    }
}
