//! Persistence traits for users, device sessions and document metadata.
//!
//! Two backends implement them: [`postgres::PgStore`] for deployments and
//! [`memory::MemoryStore`] for tests and local runs without a database.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewTokenRecord, NewUser, TokenRecord, User, UserWithPassword};
use crate::models::files::{FileMeta, FileRecord, Page};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data violates an invariant the store is supposed to uphold.
    #[error("Store corruption: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(
                db.constraint()
                    .map(|c| format!("unique constraint '{c}' violated"))
                    .unwrap_or_else(|| db.message().to_string()),
            ),
            _ => StoreError::Db(e),
        }
    }
}

/// Credential Store: user accounts and their password hashes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user whose username OR email matches.
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Fetch a user (with password hash) by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, StoreError>;

    /// Fetch a user by ID.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user. Duplicate username or email yields [`StoreError::Conflict`].
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Returns true when the backing store is reachable.
    async fn ping(&self) -> bool;
}

/// Token Store: one record per device session.
///
/// Lookups return every matching row; callers decide how to treat
/// duplicates.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new active record.
    async fn insert_token(&self, record: NewTokenRecord) -> Result<TokenRecord, StoreError>;

    /// Active records for `user_id` whose access token equals `access_token`.
    async fn find_active_by_access(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<Vec<TokenRecord>, StoreError>;

    /// Active records whose refresh token equals `refresh_token`.
    async fn find_active_by_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<Vec<TokenRecord>, StoreError>;

    /// Atomically replace the token pair on record `id`, but only while it is
    /// still active and still holds `expected_refresh`. Returns `None` when
    /// another writer got there first.
    async fn rotate_token(
        &self,
        id: &str,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Option<TokenRecord>, StoreError>;

    /// Block exactly one record.
    async fn block_token(&self, id: &str) -> Result<(), StoreError>;

    /// Block every record owned by `user_id`. Returns the number of rows touched.
    async fn block_all_tokens(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// File Store: document metadata scoped by owner.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert_file(&self, user_id: &str, meta: FileMeta) -> Result<FileRecord, StoreError>;

    async fn list_files(&self, user_id: &str, page: Page) -> Result<Vec<FileRecord>, StoreError>;

    async fn get_file(&self, user_id: &str, file_id: &str)
    -> Result<Option<FileRecord>, StoreError>;

    /// Replace the metadata of an owned file and bump its upload date.
    async fn replace_file(
        &self,
        user_id: &str,
        file_id: &str,
        meta: FileMeta,
    ) -> Result<Option<FileRecord>, StoreError>;

    /// Delete an owned file record. Returns false when nothing matched.
    async fn delete_file(&self, user_id: &str, file_id: &str) -> Result<bool, StoreError>;
}

/// Shared handles to every store, all backed by the same implementation.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub files: Arc<dyn FileStore>,
}

impl Stores {
    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_backend(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Stores backed by process memory.
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::new()))
    }

    /// Stores that all share one backend implementing every trait.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: CredentialStore + TokenStore + FileStore + 'static,
    {
        Self {
            credentials: backend.clone(),
            tokens: backend.clone(),
            files: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
