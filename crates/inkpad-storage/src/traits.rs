//! Storage traits for the storage abstraction layer.
//!
//! This module defines the contracts that every storage backend must implement.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageError;
use crate::types::{NewNote, NewUser, Note, UserRecord};

/// Account persistence.
///
/// Implementations must be thread-safe (`Send + Sync`) and must enforce
/// email uniqueness atomically.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Stores a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StorageError>;

    /// Looks an account up by its normalized email.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing accounts.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Looks an account up by id.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing accounts.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StorageError>;

    /// Short name of the backend, for logs.
    fn backend_name(&self) -> &'static str;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionError` when the backend is down.
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Note persistence.
///
/// Every operation except `create` is scoped to an owner. A note owned by
/// somebody else is indistinguishable from one that does not exist.
///
/// # Example
///
/// ```ignore
/// use inkpad_storage::{NoteStorage, StorageError};
///
/// async fn remove(storage: &dyn NoteStorage, id: Uuid, owner: Uuid) -> Result<(), StorageError> {
///     storage
///         .delete_owned(id, owner)
///         .await?
///         .map(|_| ())
///         .ok_or_else(|| StorageError::not_found("note", id.to_string()))
/// }
/// ```
#[async_trait]
pub trait NoteStorage: Send + Sync {
    /// Returns all notes belonging to `owner`, newest first.
    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Note>, StorageError>;

    /// Stores a new note. Both timestamps are set to the current time.
    async fn create(&self, note: NewNote) -> Result<Note, StorageError>;

    /// Replaces the content of a note if, and only if, it belongs to `owner`.
    ///
    /// Bumps `updated_at`. Returns `None` when no matching note exists.
    async fn update_owned(
        &self,
        id: Uuid,
        owner: Uuid,
        content: String,
    ) -> Result<Option<Note>, StorageError>;

    /// Removes a note if, and only if, it belongs to `owner`.
    ///
    /// Returns the removed note, or `None` when no matching note exists.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Note>, StorageError>;

    /// Short name of the backend, for logs.
    fn backend_name(&self) -> &'static str;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
