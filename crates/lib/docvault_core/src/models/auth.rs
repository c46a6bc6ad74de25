//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request and
//! response shapes (which carry `#[serde(rename_all = "camelCase")]`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Lifecycle state of a device session. `Active -> Blocked` is one-way;
/// refresh only touches active records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Active,
    Blocked,
}

impl TokenStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenStatus::Active => "active",
            TokenStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TokenStatus::Active),
            "blocked" => Ok(TokenStatus::Blocked),
            other => Err(format!("unknown token status '{other}'")),
        }
    }
}

/// One device session: an issued token pair plus its status.
///
/// Records are never deleted; logout only flips `status` to `Blocked`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub status: TokenStatus,
    pub device_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn is_active(&self) -> bool {
        self.status == TokenStatus::Active
    }
}

/// Fields required to persist a freshly issued token pair.
#[derive(Debug, Clone)]
pub struct NewTokenRecord {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub device_info: Option<String>,
}

/// Claims embedded in both access and refresh tokens.
///
/// Access tokens carry `exp`; refresh tokens do not, their lifetime is
/// governed by the stored record's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Issue time in unix milliseconds.
    pub timestamp: i64,
    /// Random component so two pairs minted in the same millisecond differ.
    pub nonce: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds). Absent on refresh tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The authenticated caller of a protected operation: the user and the exact
/// session record whose access token was presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub record: TokenRecord,
}
