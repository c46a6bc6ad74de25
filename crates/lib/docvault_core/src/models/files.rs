//! Document metadata models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one uploaded document. The bytes live in the upload
/// directory under `name` + `extension`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    /// Stored file stem, e.g. `file-1718000000000-123456789`.
    pub name: String,
    /// Extension including the leading dot, e.g. `.pdf`.
    pub extension: String,
    pub mime_type: String,
    pub size: i64,
    pub upload_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// File name on disk and in download responses.
    pub fn stored_name(&self) -> String {
        format!("{}{}", self.name, self.extension)
    }
}

/// Metadata describing a stored upload, used for both create and replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub extension: String,
    pub mime_type: String,
    pub size: i64,
}

/// One page of a user's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    pub list_size: u32,
}

impl Page {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIST_SIZE: u32 = 10;

    /// Build a page, falling back to defaults for missing or zero values.
    pub fn new(page: Option<u32>, list_size: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(Self::DEFAULT_PAGE),
            list_size: list_size
                .filter(|s| *s > 0)
                .unwrap_or(Self::DEFAULT_LIST_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.list_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.list_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
