//! Signup and login route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::accounts::{AccountService, AuthResponse, LoginRequest, SignupRequest};
use crate::error::AuthError;

/// `POST /api/auth/signup`
pub async fn signup_handler(
    State(accounts): State<AccountService>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::invalid_input(e.body_text()))?;
    let response = accounts.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/auth/login`
pub async fn login_handler(
    State(accounts): State<AccountService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::invalid_input(e.body_text()))?;
    Ok(Json(accounts.login(request).await?))
}
