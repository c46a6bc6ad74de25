//! Account and session request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    RefreshRequest, SigninRequest, SignupRequest, TokenResponse, UserInfoResponse,
};
use crate::services::auth;

/// Client identifier recorded on the session.
fn device_info(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// `POST /signup`: create an account and its first session.
pub async fn signup_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<SignupRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let resp = auth::signup(
        state.stores.credentials.as_ref(),
        &state.sessions,
        body.email.as_deref(),
        body.password.as_deref(),
        body.username.as_deref(),
        device_info(&headers),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /signin`: authenticate with email + password.
pub async fn signin_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<SigninRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::signin(
        state.stores.credentials.as_ref(),
        &state.sessions,
        body.email.as_deref(),
        body.password.as_deref(),
        device_info(&headers),
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /signin/new_token`: exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(&state.sessions, body.refresh_token.as_deref()).await?;
    Ok(Json(resp))
}

/// `GET /info`: profile of the authenticated user.
pub async fn info_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<UserInfoResponse>> {
    let resp = auth::user_info(state.stores.credentials.as_ref(), user.user_id()).await?;
    Ok(Json(resp))
}

/// `GET /logout`: block the session used for this request.
pub async fn logout_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<StatusCode> {
    auth::logout(&state.sessions, &user.0.record).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /logout/all`: block every session of the user.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<StatusCode> {
    auth::logout_all(&state.sessions, user.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
