//! Password hashing.
//!
//! Argon2id with default parameters, salts from `OsRng`, stored as PHC
//! strings. The async wrappers move the work onto Tokio's blocking pool.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AuthError;

/// Hash a password for storage.
///
/// # Example
///
/// ```
/// use inkpad_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(verify_password("correct horse", &hash).unwrap());
/// assert!(!verify_password("battery staple", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// A hash no account owns, made with the same parameters as real ones.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("inkpad-decoy-password").ok());

/// Spends the same Argon2 work as [`verify_password_async`] without a stored
/// hash, so an unknown email costs as much as a wrong password.
pub async fn verify_decoy_async(password: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = DECOY_HASH.as_deref() {
            let _ = verify_password(&password, hash);
        }
    })
    .await
    .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))
}

pub async fn hash_password_async(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AuthError::internal(format!("failed to hash password: {e}")))
}

pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))?
        .map_err(|e| AuthError::internal(format!("stored hash is invalid: {e}")))
}
