//! PostgreSQL implementation of the storage traits.

use async_trait::async_trait;
use inkpad_core::{Timestamp, generate_id};
use inkpad_storage::{
    NewNote, NewUser, Note, NoteStorage, StorageError, UserRecord, UserStorage,
};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::config::PostgresConfig;
use crate::error::{is_unique_violation, query_failed};
use crate::migrations;
use crate::pool;

type UserRow = (Uuid, String, String, String, OffsetDateTime, OffsetDateTime);
type NoteRow = (Uuid, Uuid, String, OffsetDateTime, OffsetDateTime);

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, owner_id, content, created_at, updated_at";

fn user_from_row(row: UserRow) -> UserRecord {
    let (id, name, email, password_hash, created_at, updated_at) = row;
    UserRecord {
        id,
        name,
        email,
        password_hash,
        created_at: Timestamp::new(created_at),
        updated_at: Timestamp::new(updated_at),
    }
}

fn note_from_row(row: NoteRow) -> Note {
    let (id, owner, content, created_at, updated_at) = row;
    Note {
        id,
        content,
        owner,
        created_at: Timestamp::new(created_at),
        updated_at: Timestamp::new(updated_at),
    }
}

/// PostgreSQL storage backend for accounts and notes.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a connection pool and, if configured, runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        config
            .validate()
            .map_err(|message| StorageError::from(crate::PostgresError::config(message)))?;

        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Wraps an existing pool. Migrations are not run.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn select_one(&self) -> Result<(), StorageError> {
        query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::connection_error(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl UserStorage for PostgresStorage {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );

        let row: UserRow = query_as(&sql)
            .bind(generate_id())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::already_exists("user", &user.email)
                } else {
                    query_failed("create user", e)
                }
            })?;

        debug!(user_id = %row.0, "user created");
        Ok(user_from_row(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<UserRow> = query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("find user by email", e))?;
        Ok(row.map(user_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("find user by id", e))?;
        Ok(row.map(user_from_row))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.select_one().await
    }
}

#[async_trait]
impl NoteStorage for PostgresStorage {
    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Note>, StorageError> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        let rows: Vec<NoteRow> = query_as(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("list notes", e))?;
        Ok(rows.into_iter().map(note_from_row).collect())
    }

    async fn create(&self, note: NewNote) -> Result<Note, StorageError> {
        let sql = format!(
            "INSERT INTO notes (id, owner_id, content) VALUES ($1, $2, $3) \
             RETURNING {NOTE_COLUMNS}"
        );
        let row: NoteRow = query_as(&sql)
            .bind(generate_id())
            .bind(note.owner)
            .bind(&note.content)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_failed("create note", e))?;
        Ok(note_from_row(row))
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Uuid,
        content: String,
    ) -> Result<Option<Note>, StorageError> {
        let sql = format!(
            "UPDATE notes SET content = $1, updated_at = clock_timestamp() \
             WHERE id = $2 AND owner_id = $3 RETURNING {NOTE_COLUMNS}"
        );
        let row: Option<NoteRow> = query_as(&sql)
            .bind(&content)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("update note", e))?;
        Ok(row.map(note_from_row))
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Note>, StorageError> {
        let sql = format!(
            "DELETE FROM notes WHERE id = $1 AND owner_id = $2 RETURNING {NOTE_COLUMNS}"
        );
        let row: Option<NoteRow> = query_as(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("delete note", e))?;
        Ok(row.map(note_from_row))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.select_one().await
    }
}
