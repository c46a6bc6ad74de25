//! Document request handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use docvault_core::files::UPLOAD_FIELD;
use docvault_core::models::files::{FileRecord, Page};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ListFilesQuery;
use crate::services::files::{self, Upload};

/// Pull the `file` part out of a multipart body, ignoring other fields.
async fn read_upload(mut multipart: Multipart) -> AppResult<Option<Upload>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(Some(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// `POST /file/upload`: store a document (multipart field `file`).
pub async fn upload_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<FileRecord>)> {
    let upload = read_upload(multipart).await?;
    let record = files::upload(
        state.stores.files.as_ref(),
        &state.uploads,
        user.user_id(),
        upload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /file/list?page=&list_size=`: page through the user's documents.
pub async fn list_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Query(query): Query<ListFilesQuery>,
) -> AppResult<Json<Vec<FileRecord>>> {
    let page = Page::new(
        query.page.and_then(|p| p.parse().ok()),
        query.list_size.and_then(|s| s.parse().ok()),
    );
    let records = files::list(state.stores.files.as_ref(), user.user_id(), page).await?;
    Ok(Json(records))
}

/// `GET /file/{id}`: document metadata.
pub async fn get_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(file_id): Path<String>,
) -> AppResult<Json<FileRecord>> {
    let record = files::get(state.stores.files.as_ref(), user.user_id(), &file_id).await?;
    Ok(Json(record))
}

/// `GET /file/download/{id}`: document bytes as an attachment.
pub async fn download_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(file_id): Path<String>,
) -> AppResult<Response> {
    let download = files::download(
        state.stores.files.as_ref(),
        &state.uploads,
        user.user_id(),
        &file_id,
    )
    .await?;
    let headers = [
        (CONTENT_TYPE, download.mime_type),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file_name),
        ),
    ];
    Ok((headers, download.bytes).into_response())
}

/// `PUT /file/update/{id}`: replace a document (multipart field `file`).
pub async fn update_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(file_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<FileRecord>> {
    let upload = read_upload(multipart).await?;
    let record = files::replace(
        state.stores.files.as_ref(),
        &state.uploads,
        user.user_id(),
        &file_id,
        upload,
    )
    .await?;
    Ok(Json(record))
}

/// `DELETE /file/delete/{id}`: remove a document.
pub async fn delete_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(file_id): Path<String>,
) -> AppResult<StatusCode> {
    files::delete(
        state.stores.files.as_ref(),
        &state.uploads,
        user.user_id(),
        &file_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
