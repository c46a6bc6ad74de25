//! Authentication and authorization logic.
//!
//! Provides password hashing, token signing, field validation and the
//! session lifecycle shared by every protected operation.

pub mod jwt;
pub mod password;
pub mod sessions;
pub mod validators;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    MissingToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
