//! Document service: metadata in the file store, bytes in the upload directory.
//!
//! Every query is scoped by the authenticated user's ID; another user's file
//! is indistinguishable from a missing one.

use docvault_core::files::UploadDir;
use docvault_core::models::files::{FileMeta, FileRecord, Page};
use docvault_core::store::FileStore;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// A document received in a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-side file name; only its extension is kept.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Bytes and headers for a download response.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

fn file_not_found() -> AppError {
    AppError::NotFound("File not found".into())
}

/// Write the upload to disk and describe it.
async fn store_blob(uploads: &UploadDir, upload: Upload) -> AppResult<FileMeta> {
    let (name, extension) = uploads.save(&upload.file_name, &upload.bytes).await?;
    Ok(FileMeta {
        name,
        extension,
        mime_type: upload
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        size: i64::try_from(upload.bytes.len())
            .map_err(|e| AppError::Internal(format!("upload size: {e}")))?,
    })
}

/// Best-effort blob removal after a failed or superseded write.
async fn discard_blob(uploads: &UploadDir, stored_name: &str) {
    if let Err(e) = uploads.remove(stored_name).await {
        warn!(stored_name, "failed to remove upload: {e}");
    }
}

/// Store a new document for `user_id`.
pub async fn upload(
    files: &dyn FileStore,
    uploads: &UploadDir,
    user_id: &str,
    upload: Option<Upload>,
) -> AppResult<FileRecord> {
    let upload = upload.ok_or_else(|| AppError::Validation("Please upload a file".into()))?;
    let meta = store_blob(uploads, upload).await?;
    let stored_name = format!("{}{}", meta.name, meta.extension);

    match files.insert_file(user_id, meta).await {
        Ok(record) => {
            info!(user_id, file_id = %record.id, size = record.size, "uploaded document");
            Ok(record)
        }
        Err(e) => {
            discard_blob(uploads, &stored_name).await;
            Err(e.into())
        }
    }
}

/// One page of the user's documents.
pub async fn list(files: &dyn FileStore, user_id: &str, page: Page) -> AppResult<Vec<FileRecord>> {
    Ok(files.list_files(user_id, page).await?)
}

/// Metadata of one owned document.
pub async fn get(files: &dyn FileStore, user_id: &str, file_id: &str) -> AppResult<FileRecord> {
    files
        .get_file(user_id, file_id)
        .await?
        .ok_or_else(file_not_found)
}

/// Bytes of one owned document.
pub async fn download(
    files: &dyn FileStore,
    uploads: &UploadDir,
    user_id: &str,
    file_id: &str,
) -> AppResult<Download> {
    let record = get(files, user_id, file_id).await?;
    let file_name = record.stored_name();
    let bytes = uploads.read(&file_name).await?;
    Ok(Download {
        file_name,
        mime_type: record.mime_type,
        bytes,
    })
}

/// Replace an owned document's bytes and metadata.
///
/// Ownership is checked before the upload is validated, so a foreign ID is
/// a 404 even when the body is bad.
pub async fn replace(
    files: &dyn FileStore,
    uploads: &UploadDir,
    user_id: &str,
    file_id: &str,
    upload: Option<Upload>,
) -> AppResult<FileRecord> {
    let existing = get(files, user_id, file_id).await?;
    let upload = upload.ok_or_else(|| AppError::Validation("Please upload a file".into()))?;
    let meta = store_blob(uploads, upload).await?;
    let new_name = format!("{}{}", meta.name, meta.extension);

    let updated = match files.replace_file(user_id, file_id, meta).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            discard_blob(uploads, &new_name).await;
            return Err(file_not_found());
        }
        Err(e) => {
            discard_blob(uploads, &new_name).await;
            return Err(e.into());
        }
    };
    // The record already points at the new blob; a stale old blob is only logged.
    discard_blob(uploads, &existing.stored_name()).await;
    info!(user_id, file_id, "replaced document");
    Ok(updated)
}

/// Remove an owned document's bytes and record.
pub async fn delete(
    files: &dyn FileStore,
    uploads: &UploadDir,
    user_id: &str,
    file_id: &str,
) -> AppResult<()> {
    let record = get(files, user_id, file_id).await?;
    uploads.remove(&record.stored_name()).await?;
    if !files.delete_file(user_id, file_id).await? {
        return Err(file_not_found());
    }
    info!(user_id, file_id, "deleted document");
    Ok(())
}
