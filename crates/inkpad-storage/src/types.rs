//! Records exchanged between the HTTP layer and storage backends.

use inkpad_core::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account as held by a storage backend.
///
/// The password hash never leaves the server, so this type is not
/// `Serialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    /// Normalized (trimmed, lowercase) address.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Data needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

/// A rich-text note owned by a single user.
///
/// Serialized with the field names the web client expects:
/// `_id`, `content`, `user`, `createdAt`, `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Opaque HTML produced by the editor.
    pub content: String,
    #[serde(rename = "user")]
    pub owner: Uuid,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
}

/// Data needed to create a note.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner: Uuid,
    pub content: String,
}

impl NewNote {
    #[must_use]
    pub fn new(owner: Uuid, content: impl Into<String>) -> Self {
        Self {
            owner,
            content: content.into(),
        }
    }
}
