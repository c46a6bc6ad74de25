//! Application error types.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docvault_core::auth::AuthError;
use docvault_core::files::FileError;
use docvault_core::store::StoreError;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Full error text, attached to every error response as an extension.
/// Only rendered into the body when the environment allows it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error, message) = match &self {
            AppError::Validation(m) => ("validation_error", m.as_str()),
            AppError::Unauthorized(m) => ("unauthorized", m.as_str()),
            AppError::Forbidden(m) => ("forbidden", m.as_str()),
            AppError::NotFound(m) => ("not_found", m.as_str()),
            AppError::Conflict(m) => ("conflict", m.as_str()),
            AppError::Internal(_) => ("internal_error", "Internal server error"),
        };
        if let AppError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
            detail: None,
        });
        let mut response = (self.status(), body).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetail(self.to_string()));
        response
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Corrupt(msg) => AppError::Internal(format!("store corruption: {msg}")),
            StoreError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Validation("Invalid password".into()),
            AuthError::UserNotFound => AppError::Validation("User not found".into()),
            AuthError::MissingToken(msg) => AppError::Unauthorized(msg),
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
            AuthError::InvalidToken(msg) => AppError::Forbidden(msg),
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<FileError> for AppError {
    fn from(e: FileError) -> Self {
        match e {
            FileError::NotADocument | FileError::TooLarge => AppError::Validation(e.to_string()),
            FileError::NotFound => AppError::NotFound("File not found".into()),
            FileError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(e.body_text())
    }
}
