//! Signup and login.

use std::sync::Arc;

use inkpad_core::{normalize_email, require_non_empty};
use inkpad_storage::{DynUserStorage, NewUser, UserRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password::{hash_password_async, verify_decoy_async, verify_password_async};
use crate::token::TokenService;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both signup and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Account operations over a user store and a token service.
#[derive(Clone)]
pub struct AccountService {
    users: DynUserStorage,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(users: DynUserStorage, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Registers a new account and signs the caller in.
    #[instrument(skip_all)]
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AuthError> {
        let name = require_non_empty("name", &request.name)?.to_string();
        let email = normalize_email(&request.email)?;
        if request.password.is_empty() {
            return Err(AuthError::invalid_input("Invalid password: must not be empty"));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            debug!("signup rejected, email already registered");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password_async(request.password).await?;
        // Racing signups surface here as AlreadyExists -> EmailTaken.
        let user = self
            .users
            .create(NewUser::new(name, email, password_hash))
            .await?;

        info!(user_id = %user.id, "account created");
        self.respond(user)
    }

    /// Checks credentials and issues a fresh token.
    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let Ok(email) = normalize_email(&request.email) else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_decoy_async(request.password).await?;
            debug!("login rejected, unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_async(request.password, user.password_hash.clone()).await? {
            debug!(user_id = %user.id, "login rejected, wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(user_id = %user.id, "login succeeded");
        self.respond(user)
    }

    fn respond(&self, user: UserRecord) -> Result<AuthResponse, AuthError> {
        let token = self.tokens.issue(user.id)?;
        Ok(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpad_db_memory::InMemoryStorage;
    use std::time::Duration;

    fn service() -> AccountService {
        let tokens = TokenService::new(b"accounts-test-secret", Duration::from_secs(3600));
        AccountService::new(Arc::new(InMemoryStorage::new()), Arc::new(tokens))
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            name: "Ada".into(),
            email: email.into(),
            password: "analytical".into(),
        }
    }

    #[tokio::test]
    async fn test_signup_returns_token_for_new_user() {
        let accounts = service();
        let response = accounts.signup(signup_request("Ada@Example.com ")).await.unwrap();

        assert_eq!(response.name, "Ada");
        assert_eq!(response.email, "ada@example.com");
        let claims = accounts.tokens().verify(&response.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), response.id);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email_case_insensitively() {
        let accounts = service();
        accounts.signup(signup_request("ada@example.com")).await.unwrap();

        let err = accounts
            .signup(signup_request("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_signup_validates_input() {
        let accounts = service();

        let mut request = signup_request("ada@example.com");
        request.name = "  ".into();
        assert!(matches!(
            accounts.signup(request).await,
            Err(AuthError::InvalidInput { .. })
        ));

        assert!(matches!(
            accounts.signup(signup_request("not-an-email")).await,
            Err(AuthError::InvalidInput { .. })
        ));

        let mut request = signup_request("ada@example.com");
        request.password.clear();
        assert!(matches!(
            accounts.signup(request).await,
            Err(AuthError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_round_trip_and_failures() {
        let accounts = service();
        let created = accounts.signup(signup_request("ada@example.com")).await.unwrap();

        let ok = accounts
            .login(LoginRequest {
                email: " ADA@example.com".into(),
                password: "analytical".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok.id, created.id);

        let wrong_password = accounts
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: "difference".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));

        let unknown = accounts
            .login(LoginRequest {
                email: "babbage@example.com".into(),
                password: "analytical".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong_password.to_string());
    }

    #[test]
    fn test_auth_response_shape() {
        let response = AuthResponse {
            id: Uuid::nil(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            token: "t".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["_id"], Uuid::nil().to_string());
        assert!(json.get("id").is_none());
    }
}
