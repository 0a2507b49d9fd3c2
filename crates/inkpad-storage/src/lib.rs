//! # inkpad-storage
//!
//! Storage abstraction layer for the Inkpad server.
//!
//! This crate defines the traits and types that every storage backend must
//! implement. It contains no backends itself; see `inkpad-db-memory` and
//! `inkpad-db-postgres`.
//!
//! ## Overview
//!
//! - [`UserStorage`] creates and looks up accounts. Email addresses are unique.
//! - [`NoteStorage`] lists, creates, updates and deletes notes. Every mutation
//!   is scoped to an owner: a note that belongs to somebody else behaves
//!   exactly like a note that does not exist.
//!
//! ## Example
//!
//! ```ignore
//! use inkpad_storage::{NewNote, Note, NoteStorage, StorageResult};
//!
//! async fn first_note(storage: &dyn NoteStorage, owner: uuid::Uuid) -> StorageResult<Note> {
//!     storage.create(NewNote::new(owner, "<p>hello</p>")).await
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{NoteStorage, UserStorage};
pub use types::{NewNote, NewUser, Note, UserRecord};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle to a user storage backend.
pub type DynUserStorage = std::sync::Arc<dyn UserStorage>;

/// Shared handle to a note storage backend.
pub type DynNoteStorage = std::sync::Arc<dyn NoteStorage>;
