//! Authentication configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum accepted length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// One week.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Signing secret and token lifetime.
///
/// ```toml
/// [auth]
/// jwt_secret = "change-me-to-something-long"
/// token_ttl = "7d"
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens.
    pub jwt_secret: String,

    /// How long an issued token stays valid.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.trim().is_empty() {
            return Err("auth.jwt_secret is required".into());
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes"
            ));
        }
        if self.token_ttl.is_zero() {
            return Err("auth.token_ttl must be greater than zero".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl, Duration::from_secs(604_800));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(AuthConfig::new("short").validate().is_err());
        assert!(AuthConfig::new("sixteen-bytes-ok").validate().is_ok());
        assert!(
            AuthConfig::new("sixteen-bytes-ok")
                .with_token_ttl(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_humantime_ttl() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"jwt_secret": "0123456789abcdef", "token_ttl": "12h"}"#)
                .unwrap();
        assert_eq!(config.token_ttl, Duration::from_secs(12 * 3600));
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", AuthConfig::new("super-secret-value-1234"));
        assert!(!rendered.contains("super-secret"));
    }
}
