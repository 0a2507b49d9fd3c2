//! Accounts and authentication for the Inkpad server.
//!
//! - [`password`]: Argon2id hashing
//! - [`token`]: HS256 identity tokens with a fixed lifetime
//! - [`accounts`]: signup and login
//! - [`middleware`]: the [`BearerAuth`](middleware::BearerAuth) extractor
//! - [`http`]: route handlers

pub mod accounts;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod password;
pub mod token;

pub use accounts::{AccountService, AuthResponse, LoginRequest, SignupRequest};
pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{AuthContext, AuthState, BearerAuth};
pub use token::{JwtError, TokenClaims, TokenService};
