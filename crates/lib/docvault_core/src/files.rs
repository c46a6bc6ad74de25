//! Document blob storage on the local filesystem.
//!
//! Metadata lives in the [`FileStore`](crate::store::FileStore); this module
//! owns the upload directory and the document-type filter.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::{Rng, rng};
use thiserror::Error;
use tracing::{debug, warn};

/// Upload size limit: 5 MiB.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted document extensions (lowercase, without the dot).
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Multipart field name the upload is read from; also the stored-name prefix.
pub const UPLOAD_FIELD: &str = "file";

/// Document storage errors.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Only documents are allowed!")]
    NotADocument,

    #[error("File exceeds the {} byte limit", MAX_UPLOAD_BYTES)]
    TooLarge,

    #[error("File not found")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the extension of `original_name` (with leading dot) when it is an
/// accepted document type.
pub fn document_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    DOCUMENT_EXTENSIONS
        .contains(&ext)
        .then(|| format!(".{ext}"))
}

/// Directory holding uploaded document bytes.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if it does not exist.
    pub async fn ensure(&self) -> Result<(), FileError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a new upload and return its stored stem and extension.
    ///
    /// Stored names are `file-<unix millis>-<random>` so concurrent uploads
    /// of identically named documents never clash.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<(String, String), FileError> {
        let extension = document_extension(original_name).ok_or(FileError::NotADocument)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(FileError::TooLarge);
        }
        self.ensure().await?;
        let stem = format!(
            "{UPLOAD_FIELD}-{}-{}",
            Utc::now().timestamp_millis(),
            rng().random_range(0..1_000_000_000u32)
        );
        let path = self.path_for(&format!("{stem}{extension}"))?;
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok((stem, extension))
    }

    /// Read a stored document.
    pub async fn read(&self, stored_name: &str) -> Result<Vec<u8>, FileError> {
        let path = self.path_for(stored_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored document. A blob that is already gone is not an error.
    pub async fn remove(&self, stored_name: &str) -> Result<(), FileError> {
        let path = self.path_for(stored_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "upload already missing on disk");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a stored name inside the root, refusing anything that is not a
    /// bare file name.
    fn path_for(&self, stored_name: &str) -> Result<PathBuf, FileError> {
        let name = Path::new(stored_name);
        if name.file_name().map(Path::new) != Some(name) {
            return Err(FileError::NotFound);
        }
        Ok(self.root.join(name))
    }
}
