//! Session and cookie settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a session stays valid after it is issued.
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,

    /// How often expired session records are purged.
    #[serde(with = "humantime_serde")]
    pub purge_interval: Duration,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(3600),
            purge_interval: Duration::from_secs(600),
            cookie: CookieConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Session TTL as a `time::Duration` for timestamp arithmetic.
    pub fn ttl(&self) -> time::Duration {
        time::Duration::try_from(self.session_ttl).unwrap_or(time::Duration::MAX)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.session_ttl.is_zero() {
            return Err("auth.session_ttl must be greater than zero".into());
        }
        if self.purge_interval.is_zero() {
            return Err("auth.purge_interval must be greater than zero".into());
        }
        if self.cookie.name.trim().is_empty() {
            return Err("auth.cookie.name must not be empty".into());
        }
        Ok(())
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Set the `Secure` attribute. Enable behind HTTPS.
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "recipes_session".to_string(),
            secure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.cookie.name, "recipes_session");
        assert!(!config.cookie.secure);
        assert!(config.validate().is_ok());
        assert_eq!(config.ttl(), time::Duration::hours(1));
    }

    #[test]
    fn test_humantime_fields() {
        let config: SessionConfig = serde_json::from_value(serde_json::json!({
            "session_ttl": "15m",
            "cookie": { "secure": true }
        }))
        .unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(900));
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.name, "recipes_session");
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = SessionConfig {
            session_ttl: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
