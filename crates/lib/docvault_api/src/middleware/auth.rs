//! Authorization gate: Bearer token extraction and session validation.
//!
//! Runs before every protected handler. A request only reaches the handler
//! when its access token is correctly signed, unexpired, and still backed by
//! an active session record.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use docvault_core::models::auth::Principal;

use crate::AppState;
use crate::error::AppError;

/// The resolved caller, stored in request extensions.
///
/// Carries the exact session record that authenticated the request, so
/// logout blocks that record and no other.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

/// What the `Authorization` header presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    /// No header, or a header without a token part.
    Absent,
    /// `Bearer <token>`.
    Bearer(&'a str),
    /// A token part under any other shape (`Token x`, `bearer x`, `Basic abc`).
    Malformed,
}

/// Classify the `Authorization` header of a request.
pub fn credential(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Credential::Absent;
    };
    let Ok(value) = value.to_str() else {
        return Credential::Malformed;
    };
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (_, None, _) => Credential::Absent,
        (Some("Bearer"), Some(token), None) => Credential::Bearer(token),
        _ => Credential::Malformed,
    }
}

/// Axum middleware: resolves the bearer token through the session manager and
/// injects `AuthenticatedUser` into request extensions.
///
/// No token or an expired token → 401; a malformed header, bad signature,
/// unknown or blocked session → 403.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match credential(request.headers()) {
        Credential::Bearer(token) => token.to_owned(),
        Credential::Absent => return Err(AppError::Unauthorized("No token provided".into())),
        Credential::Malformed => return Err(AppError::Forbidden("Invalid token".into())),
    };

    let principal = state.sessions.validate_access(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(principal));

    Ok(next.run(request).await)
}
