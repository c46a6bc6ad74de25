//! In-process store.
//!
//! Holds everything behind one `RwLock`, enforcing the same uniqueness rules
//! as the SQL schema. Used by tests and by `--store memory` local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, FileStore, StoreError, TokenStore};
use crate::models::auth::{
    NewTokenRecord, NewUser, TokenRecord, TokenStatus, User, UserWithPassword,
};
use crate::models::files::{FileMeta, FileRecord, Page};

#[derive(Debug, Default)]
struct State {
    users: Vec<UserWithPassword>,
    tokens: HashMap<String, TokenRecord>,
    files: Vec<FileRecord>,
}

impl State {
    fn token_value_taken(&self, value: &str, except_id: Option<&str>) -> bool {
        self.tokens.values().any(|t| {
            Some(t.id.as_str()) != except_id && (t.access_token == value || t.refresh_token == value)
        })
    }
}

/// Memory-backed implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// Every token record owned by `user_id`, whatever its status.
    pub async fn tokens_of(&self, user_id: &str) -> Vec<TokenRecord> {
        let state = self.state.read().await;
        state
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of token records across all users.
    pub async fn token_count(&self) -> usize {
        self.state.read().await.tokens.len()
    }

    /// Insert a token record verbatim, bypassing uniqueness checks.
    #[cfg(test)]
    pub(crate) async fn insert_raw_token(&self, record: TokenRecord) {
        self.state
            .write()
            .await
            .tokens
            .insert(record.id.clone(), record);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.user.username == username || u.user.email == email)
            .map(|u| u.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.user.id == user_id)
            .map(|u| u.user.clone()))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.user.username == user.username) {
            return Err(StoreError::Conflict("username already exists".into()));
        }
        if state.users.iter().any(|u| u.user.email == user.email) {
            return Err(StoreError::Conflict("email already exists".into()));
        }
        let created = User {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
        };
        state.users.push(UserWithPassword {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, record: NewTokenRecord) -> Result<TokenRecord, StoreError> {
        let mut state = self.state.write().await;
        if state.token_value_taken(&record.access_token, None)
            || state.token_value_taken(&record.refresh_token, None)
        {
            return Err(StoreError::Conflict("token value already issued".into()));
        }
        let now = Utc::now();
        let stored = TokenRecord {
            id: Uuid::now_v7().to_string(),
            user_id: record.user_id,
            access_token: record.access_token,
            refresh_token: record.refresh_token,
            status: TokenStatus::Active,
            device_info: record.device_info,
            created_at: now,
            updated_at: now,
        };
        state.tokens.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_active_by_access(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<Vec<TokenRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .values()
            .filter(|t| t.user_id == user_id && t.access_token == access_token && t.is_active())
            .cloned()
            .collect())
    }

    async fn find_active_by_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<Vec<TokenRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .values()
            .filter(|t| t.refresh_token == refresh_token && t.is_active())
            .cloned()
            .collect())
    }

    async fn rotate_token(
        &self,
        id: &str,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let mut state = self.state.write().await;
        if state.token_value_taken(access_token, Some(id))
            || state.token_value_taken(refresh_token, Some(id))
        {
            return Err(StoreError::Conflict("token value already issued".into()));
        }
        let Some(record) = state.tokens.get_mut(id) else {
            return Ok(None);
        };
        if !record.is_active() || record.refresh_token != expected_refresh {
            return Ok(None);
        }
        record.access_token = access_token.to_string();
        record.refresh_token = refresh_token.to_string();
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn block_token(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(record) = state.tokens.get_mut(id) {
            record.status = TokenStatus::Blocked;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn block_all_tokens(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for record in state.tokens.values_mut().filter(|t| t.user_id == user_id) {
            record.status = TokenStatus::Blocked;
            record.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn insert_file(&self, user_id: &str, meta: FileMeta) -> Result<FileRecord, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let record = FileRecord {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            name: meta.name,
            extension: meta.extension,
            mime_type: meta.mime_type,
            size: meta.size,
            upload_date: now,
            created_at: now,
            updated_at: now,
        };
        state.files.push(record.clone());
        Ok(record)
    }

    async fn list_files(&self, user_id: &str, page: Page) -> Result<Vec<FileRecord>, StoreError> {
        let state = self.state.read().await;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(state
            .files
            .iter()
            .filter(|f| f.user_id == user_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_file(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .files
            .iter()
            .find(|f| f.id == file_id && f.user_id == user_id)
            .cloned())
    }

    async fn replace_file(
        &self,
        user_id: &str,
        file_id: &str,
        meta: FileMeta,
    ) -> Result<Option<FileRecord>, StoreError> {
        let mut state = self.state.write().await;
        let Some(record) = state
            .files
            .iter_mut()
            .find(|f| f.id == file_id && f.user_id == user_id)
        else {
            return Ok(None);
        };
        let now = Utc::now();
        record.name = meta.name;
        record.extension = meta.extension;
        record.mime_type = meta.mime_type;
        record.size = meta.size;
        record.upload_date = now;
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn delete_file(&self, user_id: &str, file_id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.files.len();
        state
            .files
            .retain(|f| !(f.id == file_id && f.user_id == user_id));
        Ok(state.files.len() < before)
    }
}
