//! Authentication error types.

/// Errors that can occur while signing in or validating a session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username or password did not match. Never says which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request carried no session token.
    #[error("Missing session token")]
    MissingToken,

    /// The token is not known to this service.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The session has passed its expiry time.
    #[error("Token expired")]
    TokenExpired,

    /// The session was signed out or replaced by a refresh.
    #[error("Token revoked")]
    TokenRevoked,

    /// The request body is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// Session or user storage failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Storage, configuration and internal failures. These map to 500
    /// and are logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Everything that ends in a 401.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::InvalidToken { .. }
                | Self::TokenExpired
                | Self::TokenRevoked
        )
    }

    /// Short machine-readable label for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::MissingToken => "missing_token",
            Self::InvalidToken { .. } => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Storage { .. } => "storage",
            Self::Configuration { .. } => "configuration",
            Self::Internal { .. } => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_message() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(
            AuthError::storage("database down").to_string(),
            "Storage error: database down"
        );
    }

    #[test]
    fn test_classification() {
        let rejected = [
            AuthError::InvalidCredentials,
            AuthError::MissingToken,
            AuthError::invalid_token("unknown"),
            AuthError::TokenExpired,
            AuthError::TokenRevoked,
        ];
        for err in &rejected {
            assert!(err.is_authentication_error(), "{}", err.kind());
            assert!(!err.is_server_error());
        }

        let bad_body = AuthError::invalid_request("bad json");
        assert!(!bad_body.is_authentication_error());
        assert!(!bad_body.is_server_error());

        let down = AuthError::storage("database down");
        assert!(down.is_server_error());
        assert_eq!(down.kind(), "storage");
    }
}
