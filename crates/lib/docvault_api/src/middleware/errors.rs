//! Error detail exposure, switched by the configured environment.

use axum::Json;
use axum::body::to_bytes;
use axum::http::header::CONTENT_LENGTH;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;
use crate::error::ErrorDetail;
use crate::models::ErrorResponse;

/// Error bodies are small JSON objects; anything larger is left untouched.
const ERROR_BODY_LIMIT: usize = 64 * 1024;

/// Axum middleware: in development, copies the [`ErrorDetail`] extension of
/// an error response into its JSON body as `detail`. Production responses
/// pass through unchanged.
pub async fn expose_error_detail(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.environment.exposes_error_detail() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, ERROR_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("could not buffer error body: {e}");
            return parts.status.into_response();
        }
    };
    let Ok(mut error) = serde_json::from_slice::<ErrorResponse>(&bytes) else {
        return Response::from_parts(parts, bytes.into());
    };
    error.detail = Some(detail);
    parts.headers.remove(CONTENT_LENGTH);
    (parts, Json(error)).into_response()
}
