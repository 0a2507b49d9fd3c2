//! In-memory storage backend for the Inkpad server.
//!
//! This crate provides an in-memory implementation of the `UserStorage` and
//! `NoteStorage` traits from `inkpad-storage`, using `dashmap` for concurrent
//! access. Nothing survives a restart; it backs the test suites and
//! `storage.backend = "memory"`.
//!
//! # Example
//!
//! ```ignore
//! use inkpad_db_memory::InMemoryStorage;
//! use inkpad_storage::{NewNote, NoteStorage};
//!
//! let storage = InMemoryStorage::new();
//! let note = storage.create(NewNote::new(owner, "<p>draft</p>")).await?;
//! ```

mod storage;

pub use inkpad_storage::{NoteStorage, StorageError, UserStorage};
pub use storage::InMemoryStorage;

use inkpad_storage::{DynNoteStorage, DynUserStorage};
use std::sync::Arc;

/// Creates a fresh in-memory backend and returns it behind both storage traits.
pub fn create_storage() -> (DynUserStorage, DynNoteStorage) {
    let storage = Arc::new(InMemoryStorage::new());
    (storage.clone(), storage)
}
