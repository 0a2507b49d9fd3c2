//! Authentication error types.

use std::fmt;

use inkpad_storage::StorageError;

use crate::token::JwtError;

/// Errors raised by signup, login and bearer authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    /// Malformed signup or login input.
    #[error("{message}")]
    InvalidInput { message: String },

    /// No usable credential was presented.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AuthError {
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` for failures that should be answered with 401.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::InvalidToken { .. } | Self::TokenExpired
        )
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials | Self::EmailTaken | Self::InvalidInput { .. } => {
                ErrorCategory::Client
            }
            Self::Unauthorized { .. } | Self::InvalidToken { .. } | Self::TokenExpired => {
                ErrorCategory::Authentication
            }
            Self::Storage { .. } => ErrorCategory::Storage,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        if err.is_already_exists() {
            Self::EmailTaken
        } else {
            Self::storage(err.to_string())
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::TokenExpired,
            JwtError::EncodingError { message } => Self::internal(message),
            other => Self::invalid_token(other.to_string()),
        }
    }
}

impl From<inkpad_core::CoreError> for AuthError {
    fn from(err: inkpad_core::CoreError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

/// Error categories for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Authentication,
    Storage,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Authentication => write!(f, "authentication"),
            Self::Storage => write!(f, "storage"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
