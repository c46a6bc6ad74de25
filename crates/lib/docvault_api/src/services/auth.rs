//! Account service: signup/signin/refresh/logout flows over `docvault_core`.

use docvault_core::auth::password::{hash_password, verify_password};
use docvault_core::auth::sessions::SessionManager;
use docvault_core::auth::validators::validate_signup;
use docvault_core::auth::AuthError;
use docvault_core::models::auth::{NewUser, TokenPair, TokenRecord};
use docvault_core::store::{CredentialStore, StoreError};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{TokenResponse, UserInfoResponse};

const DUPLICATE_ACCOUNT: &str = "Username or email already exists";

fn token_response(pair: TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }
}

/// Returns the value when present and non-empty.
fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Register a new account and open its first device session.
pub async fn signup(
    credentials: &dyn CredentialStore,
    sessions: &SessionManager,
    email: Option<&str>,
    password: Option<&str>,
    username: Option<&str>,
    device_info: Option<String>,
) -> AppResult<TokenResponse> {
    let (Some(email), Some(password), Some(username)) =
        (required(email), required(password), required(username))
    else {
        return Err(AppError::Validation("All fields are required".into()));
    };

    validate_signup(email, password, username)?;

    if credentials
        .find_by_username_or_email(username, email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(DUPLICATE_ACCOUNT.into()));
    }

    let password_hash = hash_password(password).await?;

    let user = credentials
        .create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent signup with the same identity.
            StoreError::Conflict(_) => AppError::Conflict(DUPLICATE_ACCOUNT.into()),
            other => AppError::from(other),
        })?;
    info!(user_id = %user.id, username = %user.username, "registered user");

    let pair = sessions.issue(&user.id, device_info).await?;
    Ok(token_response(pair))
}

/// Authenticate with email + password and open a new device session.
pub async fn signin(
    credentials: &dyn CredentialStore,
    sessions: &SessionManager,
    email: Option<&str>,
    password: Option<&str>,
    device_info: Option<String>,
) -> AppResult<TokenResponse> {
    let (Some(email), Some(password)) = (required(email), required(password)) else {
        return Err(AppError::Validation("All fields are required".into()));
    };

    let account = credentials
        .find_by_email(email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !verify_password(password, &account.password_hash).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = sessions.issue(&account.user.id, device_info).await?;
    Ok(token_response(pair))
}

/// Exchange a refresh token for a new pair on the same session.
pub async fn refresh(
    sessions: &SessionManager,
    refresh_token: Option<&str>,
) -> AppResult<TokenResponse> {
    let pair = sessions.rotate(refresh_token).await?;
    Ok(token_response(pair))
}

/// Public profile of the authenticated user.
pub async fn user_info(
    credentials: &dyn CredentialStore,
    user_id: &str,
) -> AppResult<UserInfoResponse> {
    let user = credentials
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(UserInfoResponse {
        id: user.id,
        email: user.email,
        username: user.username,
    })
}

/// Logout: block the session that authenticated this request.
pub async fn logout(sessions: &SessionManager, record: &TokenRecord) -> AppResult<()> {
    sessions.revoke(record).await?;
    Ok(())
}

/// Logout all sessions: block every session of the user.
pub async fn logout_all(sessions: &SessionManager, user_id: &str) -> AppResult<()> {
    sessions.revoke_all(user_id).await?;
    Ok(())
}
