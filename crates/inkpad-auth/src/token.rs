//! Identity tokens.
//!
//! HS256-signed JWTs carrying the user id in an `id` claim. Lifetime comes
//! from [`AuthConfig::token_ttl`](crate::config::AuthConfig).

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode token: {message}")]
    EncodingError { message: String },

    #[error("Failed to decode token: {message}")]
    DecodingError { message: String },

    #[error("Token expired")]
    Expired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },
}

impl JwtError {
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::InvalidClaims { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ImmatureSignature | ErrorKind::MissingRequiredClaim(_) => {
                Self::invalid_claims(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

/// Claims carried by every identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub id: String,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        inkpad_core::parse_id(&self.id)
            .map_err(|e| JwtError::invalid_claims(format!("id: {e}")))
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.exp).ok()
    }
}

/// Issues and verifies identity tokens with a shared secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` valid from now for the configured TTL.
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Issues a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, user_id: Uuid, issued_at: OffsetDateTime) -> Result<String, JwtError> {
        let iat = issued_at.unix_timestamp();
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| JwtError::encoding_error("token ttl out of range"))?;
        let claims = TokenClaims {
            id: user_id.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-with-enough-bytes";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::from_secs(7 * 24 * 3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let user = Uuid::new_v4();
        let token = service().issue(user).unwrap();
        let claims = service().verify(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = OffsetDateTime::now_utc() - time::Duration::days(8);
        let token = service().issue_at(Uuid::new_v4(), issued).unwrap();

        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::Expired));
    }

    #[test]
    fn test_ttl_bounds_validity() {
        let short = TokenService::new(SECRET, Duration::from_secs(60));
        let issued = OffsetDateTime::now_utc() - time::Duration::seconds(120);
        let token = short.issue_at(Uuid::new_v4(), issued).unwrap();
        assert!(matches!(short.verify(&token), Err(JwtError::Expired)));

        let fresh = short.issue(Uuid::new_v4()).unwrap();
        assert!(short.verify(&fresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue(Uuid::new_v4()).unwrap();
        let other = TokenService::new(b"a-completely-different-secret", Duration::from_secs(60));

        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_garbage_rejected() {
        let err = service().verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, JwtError::DecodingError { .. }));
    }

    #[test]
    fn test_non_uuid_claim_rejected() {
        let claims = TokenClaims {
            id: "64f1c0ffee".into(),
            iat: 0,
            exp: i64::MAX,
        };
        assert!(claims.user_id().is_err());
    }
}
