//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, FileStore, StoreError, TokenStore};
use crate::models::auth::{
    NewTokenRecord, NewUser, TokenRecord, TokenStatus, User, UserWithPassword,
};
use crate::models::files::{FileMeta, FileRecord, Page};

/// Column list shared by every query that returns a [`TokenRecord`].
const TOKEN_COLUMNS: &str = "id::text, user_id::text, token, refresh_token, status::text, \
     device_info, created_at, updated_at";

/// Column list shared by every query that returns a [`FileRecord`].
const FILE_COLUMNS: &str = "id::text, user_id::text, name, extension, mime_type, size, \
     upload_date, created_at, updated_at";

type TokenRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type FileRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn token_from_row(row: TokenRow) -> Result<TokenRecord, StoreError> {
    let (id, user_id, access_token, refresh_token, status, device_info, created_at, updated_at) =
        row;
    let status = status.parse::<TokenStatus>().map_err(StoreError::Corrupt)?;
    Ok(TokenRecord {
        id,
        user_id,
        access_token,
        refresh_token,
        status,
        device_info,
        created_at,
        updated_at,
    })
}

fn tokens_from_rows(rows: Vec<TokenRow>) -> Result<Vec<TokenRecord>, StoreError> {
    rows.into_iter().map(token_from_row).collect()
}

fn file_from_row(row: FileRow) -> FileRecord {
    let (id, user_id, name, extension, mime_type, size, upload_date, created_at, updated_at) = row;
    FileRecord {
        id,
        user_id,
        name,
        extension,
        mime_type,
        size,
        upload_date,
        created_at,
        updated_at,
    }
}

/// Store implementation over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT id::text, username, email FROM users \
             WHERE username = $1 OR email = $2 \
             LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, username, email)| User {
            id,
            username,
            email,
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id::text, username, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(
            row.map(|(id, username, email, password_hash)| UserWithPassword {
                user: User {
                    id,
                    username,
                    email,
                },
                password_hash,
            }),
        )
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        // Tokens carry arbitrary strings in `sub`; a non-UUID simply matches nothing.
        let Ok(id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT username, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(username, email)| User {
            id: user_id.to_string(),
            username,
            email,
        }))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let id = sqlx::query_scalar::<_, String>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id::text",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(User {
            id,
            username: user.username,
            email: user.email,
        })
    }

    async fn ping(&self) -> bool {
        crate::db::ping(&self.pool).await
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_token(&self, record: NewTokenRecord) -> Result<TokenRecord, StoreError> {
        let sql = format!(
            "INSERT INTO tokens (id, user_id, token, refresh_token, status, device_info) \
             VALUES ($1, $2::uuid, $3, $4, 'active', $5) \
             RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&record.user_id)
            .bind(&record.access_token)
            .bind(&record.refresh_token)
            .bind(&record.device_info)
            .fetch_one(&self.pool)
            .await?;
        token_from_row(row)
    }

    async fn find_active_by_access(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<Vec<TokenRecord>, StoreError> {
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE user_id = $1 AND token = $2 AND status = 'active'"
        );
        let rows = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(user_id)
            .bind(access_token)
            .fetch_all(&self.pool)
            .await?;
        tokens_from_rows(rows)
    }

    async fn find_active_by_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<Vec<TokenRecord>, StoreError> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE refresh_token = $1 AND status = 'active'"
        );
        let rows = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(refresh_token)
            .fetch_all(&self.pool)
            .await?;
        tokens_from_rows(rows)
    }

    async fn rotate_token(
        &self,
        id: &str,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Option<TokenRecord>, StoreError> {
        // Single statement: the row lock taken by UPDATE serialises racing
        // rotations, and the WHERE clause makes the loser match zero rows.
        let sql = format!(
            "UPDATE tokens \
             SET token = $3, refresh_token = $4, status = 'active', updated_at = now() \
             WHERE id = $1::uuid AND refresh_token = $2 AND status = 'active' \
             RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(id)
            .bind(expected_refresh)
            .bind(access_token)
            .bind(refresh_token)
            .fetch_optional(&self.pool)
            .await?;
        row.map(token_from_row).transpose()
    }

    async fn block_token(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE tokens SET status = 'blocked', updated_at = now() WHERE id = $1::uuid",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn block_all_tokens(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE tokens SET status = 'blocked', updated_at = now() WHERE user_id = $1::uuid",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FileStore for PgStore {
    async fn insert_file(&self, user_id: &str, meta: FileMeta) -> Result<FileRecord, StoreError> {
        let sql = format!(
            "INSERT INTO files (id, user_id, name, extension, mime_type, size) \
             VALUES ($1, $2::uuid, $3, $4, $5, $6) \
             RETURNING {FILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, FileRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&meta.name)
            .bind(&meta.extension)
            .bind(&meta.mime_type)
            .bind(meta.size)
            .fetch_one(&self.pool)
            .await?;
        Ok(file_from_row(row))
    }

    async fn list_files(&self, user_id: &str, page: Page) -> Result<Vec<FileRecord>, StoreError> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE user_id = $1::uuid \
             ORDER BY upload_date ASC, id ASC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, FileRow>(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(file_from_row).collect())
    }

    async fn get_file(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        let Ok(file_id) = Uuid::parse_str(file_id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1 AND user_id = $2::uuid");
        let row = sqlx::query_as::<_, FileRow>(&sql)
            .bind(file_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(file_from_row))
    }

    async fn replace_file(
        &self,
        user_id: &str,
        file_id: &str,
        meta: FileMeta,
    ) -> Result<Option<FileRecord>, StoreError> {
        let Ok(file_id) = Uuid::parse_str(file_id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE files \
             SET name = $3, extension = $4, mime_type = $5, size = $6, \
                 upload_date = now(), updated_at = now() \
             WHERE id = $1 AND user_id = $2::uuid \
             RETURNING {FILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, FileRow>(&sql)
            .bind(file_id)
            .bind(user_id)
            .bind(&meta.name)
            .bind(&meta.extension)
            .bind(&meta.mime_type)
            .bind(meta.size)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(file_from_row))
    }

    async fn delete_file(&self, user_id: &str, file_id: &str) -> Result<bool, StoreError> {
        let Ok(file_id) = Uuid::parse_str(file_id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2::uuid")
            .bind(file_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
