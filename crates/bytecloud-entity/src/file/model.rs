//! File/folder record model.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use bytecloud_core::types::FileId;

/// Value stored in `type` for folder records.
pub const FOLDER_TYPE: &str = "folder";

/// A file or folder owned by a user.
///
/// Records form a forest through `parent_id`. The schema alone permits
/// cycles and cross-user links; the service layer rules both out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Record identifier.
    pub id: FileId,
    /// Display name.
    pub name: String,
    /// Full logical path, e.g. `/photos/2024/beach.jpg`.
    pub path: String,
    /// Size in bytes (0 for folders).
    pub size: i64,
    /// MIME type, or [`FOLDER_TYPE`] for folders.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub file_type: String,
    /// Location of the stored bytes in object storage.
    pub file_url: String,
    /// Preview location.
    pub thumbnail_url: Option<String>,
    /// Owner, as issued by the identity provider.
    pub user_id: String,
    /// Parent folder (`None` at root level).
    pub parent_id: Option<FileId>,
    /// Folder node rather than file node.
    pub is_folder: bool,
    /// Flagged as favorite.
    pub is_starred: bool,
    /// Soft-deleted.
    pub is_trash: bool,
    /// Shared with others.
    pub is_shared: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Check if this record sits at root level.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        if self.is_folder {
            return None;
        }
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }

    /// Compute the path of a child named `name` under this record.
    pub fn child_path(&self, name: &str) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), name)
    }

    /// Advance `updated_at` to `now`, or one microsecond past the previous
    /// value when the clock has not moved beyond it.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::microseconds(1)
        };
    }

    /// Path of a root-level record named `name`.
    pub fn root_path(name: &str) -> String {
        format!("/{name}")
    }
}

/// Data required to create a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRecord {
    /// Display name.
    pub name: String,
    /// Full logical path.
    pub path: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type or folder marker.
    pub file_type: String,
    /// Object storage location.
    pub file_url: String,
    /// Preview location.
    pub thumbnail_url: Option<String>,
    /// Owner.
    pub user_id: String,
    /// Parent folder.
    pub parent_id: Option<FileId>,
    /// Whether the record is a folder.
    pub is_folder: bool,
}

impl CreateFileRecord {
    /// Materialize the record with a fresh id and timestamps; flags start cleared.
    pub fn into_record(self, now: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id: FileId::new(),
            name: self.name,
            path: self.path,
            size: self.size,
            file_type: self.file_type,
            file_url: self.file_url,
            thumbnail_url: self.thumbnail_url,
            user_id: self.user_id,
            parent_id: self.parent_id,
            is_folder: self.is_folder,
            is_starred: false,
            is_trash: false,
            is_shared: false,
            created_at: now,
            updated_at: now,
        }
    }
}
