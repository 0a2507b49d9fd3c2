use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("ID must not be empty")]
    Empty,
    #[error("Invalid ID: {0}")]
    Malformed(String),
}

/// Generates a fresh random identifier for users and notes.
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Parses an identifier taken from a URL path or token claim.
pub fn parse_id(raw: &str) -> Result<Uuid, IdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    Uuid::parse_str(trimmed).map_err(|_| IdError::Malformed(trimmed.to_string()))
}
