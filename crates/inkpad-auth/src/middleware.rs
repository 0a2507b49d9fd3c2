//! Bearer token authentication extractor.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use inkpad_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(auth): BearerAuth) -> String {
//!     format!("Hello, {}!", auth.user_id)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use inkpad_api::ApiError;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::TokenService;

/// State needed by [`BearerAuth`].
#[derive(Clone, Debug)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

impl AuthState {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub expires_at: Option<OffsetDateTime>,
}

/// Rejects the request with 401 unless it carries a valid
/// `Authorization: Bearer <token>` header.
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AuthError::unauthorized("No token provided"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthorized("Malformed Authorization header"))?;

        let claims = auth_state.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to verify token");
            AuthError::from(e)
        })?;

        let user_id = claims.user_id()?;

        Ok(BearerAuth(AuthContext {
            user_id,
            expires_at: claims.expires_at(),
        }))
    }
}

impl From<&AuthError> for ApiError {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::EmailTaken => {
                ApiError::bad_request(err.to_string())
            }
            AuthError::InvalidInput { message } => ApiError::bad_request(message.clone()),
            AuthError::Unauthorized { message } => ApiError::unauthorized(message.clone()),
            AuthError::InvalidToken { .. } => ApiError::unauthorized("Invalid token"),
            AuthError::TokenExpired => ApiError::unauthorized("Token expired"),
            AuthError::Storage { .. } | AuthError::Internal { .. } => {
                tracing::error!(error = %err, category = %err.category(), "auth failure");
                ApiError::internal("Server error")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let api_error = ApiError::from(&self);
        let status = api_error.status_code();
        let description = api_error.message().to_string();
        let mut response = api_error.into_response();

        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(&description);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

fn build_www_authenticate_header(description: &str) -> String {
    let escaped_desc = description.replace('"', "\\\"");
    format!("Bearer realm=\"inkpad\", error=\"invalid_token\", error_description=\"{escaped_desc}\"")
}
