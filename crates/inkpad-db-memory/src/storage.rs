use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use inkpad_core::{generate_id, now_utc};
use inkpad_storage::{
    NewNote, NewUser, Note, NoteStorage, StorageError, UserRecord, UserStorage,
};
use uuid::Uuid;

/// A note plus its insertion sequence, used to break `created_at` ties.
#[derive(Debug, Clone)]
struct StoredNote {
    seq: u64,
    note: Note,
}

/// In-memory storage for accounts and notes backed by `DashMap`.
///
/// Email uniqueness is enforced through the entry API on a secondary
/// email index, so two concurrent signups for the same address cannot both
/// succeed.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    users: DashMap<Uuid, UserRecord>,
    emails: DashMap<String, Uuid>,
    notes: DashMap<Uuid, StoredNote>,
    sequence: AtomicU64,
}

impl InMemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes across all owners.
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Number of registered accounts.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let id = generate_id();
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StorageError::already_exists("user", user.email)),
            Entry::Vacant(slot) => {
                let now = now_utc();
                let record = UserRecord {
                    id,
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(id, record.clone());
                slot.insert(id);
                Ok(record)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl NoteStorage for InMemoryStorage {
    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Note>, StorageError> {
        let mut owned: Vec<StoredNote> = self
            .notes
            .iter()
            .filter(|entry| entry.note.owner == owner)
            .map(|entry| entry.value().clone())
            .collect();

        owned.sort_by(|a, b| {
            b.note
                .created_at
                .cmp(&a.note.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(owned.into_iter().map(|stored| stored.note).collect())
    }

    async fn create(&self, note: NewNote) -> Result<Note, StorageError> {
        let now = now_utc();
        let note = Note {
            id: generate_id(),
            content: note.content,
            owner: note.owner,
            created_at: now,
            updated_at: now,
        };
        let stored = StoredNote {
            seq: self.next_seq(),
            note: note.clone(),
        };
        self.notes.insert(note.id, stored);
        Ok(note)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Uuid,
        content: String,
    ) -> Result<Option<Note>, StorageError> {
        let Some(mut entry) = self.notes.get_mut(&id) else {
            return Ok(None);
        };
        if entry.note.owner != owner {
            return Ok(None);
        }
        entry.note.content = content;
        entry.note.updated_at = now_utc();
        Ok(Some(entry.note.clone()))
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Note>, StorageError> {
        Ok(self
            .notes
            .remove_if(&id, |_, stored| stored.note.owner == owner)
            .map(|(_, stored)| stored.note))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn alice() -> NewUser {
        NewUser::new("Alice", "alice@example.com", "$argon2id$stub")
    }

    #[tokio::test]
    async fn test_user_create_and_lookup() {
        let storage = InMemoryStorage::new();
        let created = UserStorage::create(&storage, alice()).await.unwrap();

        let by_email = storage.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.as_ref(), Some(&created));

        let by_id = storage.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id, Some(created));

        assert!(storage.find_by_email("bob@example.com").await.unwrap().is_none());
        assert!(storage.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let storage = InMemoryStorage::new();
        UserStorage::create(&storage, alice()).await.unwrap();

        let err = UserStorage::create(&storage, alice()).await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(storage.user_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_signups_single_winner() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                UserStorage::create(storage.as_ref(), alice()).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(storage.user_count(), 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let first = NoteStorage::create(&storage, NewNote::new(owner, "first")).await.unwrap();
        let second = NoteStorage::create(&storage, NewNote::new(owner, "second")).await.unwrap();
        NoteStorage::create(&storage, NewNote::new(other, "foreign")).await.unwrap();

        let listed = storage.list_for_owner(owner).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(listed.iter().all(|n| n.owner == owner));

        assert!(storage.list_for_owner(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_ownership() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();
        let note = NoteStorage::create(&storage, NewNote::new(owner, "draft")).await.unwrap();

        let foreign = storage
            .update_owned(note.id, Uuid::new_v4(), "hijacked".into())
            .await
            .unwrap();
        assert!(foreign.is_none());

        let updated = storage
            .update_owned(note.id, owner, "final".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "final");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at >= note.updated_at);

        let missing = storage
            .update_owned(Uuid::new_v4(), owner, "x".into())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_ownership() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();
        let note = NoteStorage::create(&storage, NewNote::new(owner, "bye")).await.unwrap();

        assert!(storage.delete_owned(note.id, Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(storage.note_count(), 1);

        let removed = storage.delete_owned(note.id, owner).await.unwrap();
        assert_eq!(removed.map(|n| n.id), Some(note.id));
        assert_eq!(storage.note_count(), 0);

        assert!(storage.delete_owned(note.id, owner).await.unwrap().is_none());
    }
}
