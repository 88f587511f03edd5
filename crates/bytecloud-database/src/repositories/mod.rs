//! File record repositories.
//!
//! [`FileRepository`] is the storage seam of the hierarchy. It persists and
//! queries records; ownership and naming rules belong to the service layer.
//! Acyclicity is the exception: [`FileRepository::reparent`] checks it in the
//! same critical section as the write, so concurrent moves cannot link a loop.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use bytecloud_core::error::AppError;
use bytecloud_core::result::AppResult;
use bytecloud_core::types::FileId;
use bytecloud_entity::file::{CreateFileRecord, FileForest, FileRecord};

pub use file::PgFileRepository;
pub use memory::MemoryFileRepository;

/// Persistence operations on file/folder records.
///
/// Listings are ordered folders first, then by name.
#[async_trait]
pub trait FileRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a record by its primary key.
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileRecord>>;

    /// Direct children of `parent_id` (root level when `None`) owned by `user_id`.
    async fn find_children(
        &self,
        user_id: &str,
        parent_id: Option<FileId>,
        include_trash: bool,
    ) -> AppResult<Vec<FileRecord>>;

    /// Every starred, non-trashed record of a user.
    async fn find_starred(&self, user_id: &str) -> AppResult<Vec<FileRecord>>;

    /// Every trashed record of a user.
    async fn find_trashed(&self, user_id: &str) -> AppResult<Vec<FileRecord>>;

    /// Every record of a user.
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<FileRecord>>;

    /// The record `id` followed by all of its descendants.
    async fn find_subtree(&self, id: FileId) -> AppResult<Vec<FileRecord>>;

    /// Ancestors of `id`, nearest parent first, excluding `id` itself.
    async fn find_ancestors(&self, id: FileId) -> AppResult<Vec<FileRecord>>;

    /// Insert a new record and return it.
    async fn insert(&self, data: CreateFileRecord) -> AppResult<FileRecord>;

    /// Persist the mutable fields of each record atomically.
    ///
    /// The parent link is not one of them; only [`Self::reparent`] moves records.
    ///
    /// Every stored record gets an `updated_at` strictly later than before.
    async fn update_many(&self, records: &[FileRecord]) -> AppResult<Vec<FileRecord>>;

    /// Put `id` under `new_parent_id` (root level when `None`) and rewrite the
    /// paths of its subtree.
    ///
    /// The target is re-validated atomically with the write: it must be a
    /// non-trashed folder of the same owner and must not be `id` or one of its
    /// descendants. Returns the updated subtree, `id` first.
    async fn reparent(
        &self,
        id: FileId,
        new_parent_id: Option<FileId>,
    ) -> AppResult<Vec<FileRecord>>;

    /// Remove records by id. Returns the number of rows removed.
    async fn delete_many(&self, ids: &[FileId]) -> AppResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Persist a single record.
    async fn update(&self, record: &FileRecord) -> AppResult<FileRecord> {
        self.update_many(std::slice::from_ref(record))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("File {} not found", record.id)))
    }
}

/// Rejects a re-parent target that is not a live folder of the same owner, or
/// that lies inside the moved subtree.
///
/// `ancestors` is the current ancestor chain of `parent`.
pub(crate) fn ensure_reparent_target(
    moved: &FileRecord,
    parent: &FileRecord,
    ancestors: Vec<FileRecord>,
) -> AppResult<()> {
    if parent.user_id != moved.user_id {
        return Err(AppError::not_found("Parent folder not found"));
    }
    if !parent.is_folder {
        return Err(AppError::validation("Parent must be a folder"));
    }
    if parent.is_trash {
        return Err(AppError::validation("Parent folder is in the trash"));
    }

    let mut chain = ancestors;
    chain.push(parent.clone());
    chain.push(moved.clone());
    if FileForest::new(chain).would_create_cycle(moved.id, Some(parent.id)) {
        return Err(AppError::validation(
            "A folder cannot be moved into itself or one of its descendants",
        ));
    }
    Ok(())
}
