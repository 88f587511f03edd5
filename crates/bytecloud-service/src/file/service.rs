//! File and folder CRUD, trash and sharing.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use bytecloud_core::error::AppError;
use bytecloud_core::result::AppResult;
use bytecloud_core::types::FileId;
use bytecloud_database::FileRepository;
use bytecloud_entity::file::{CreateFileRecord, FOLDER_TYPE, FileRecord, rebase_paths};

use super::load_owned;
use crate::context::RequestContext;

/// Longest accepted display name, in characters.
const MAX_NAME_LENGTH: usize = 255;

/// Which slice of the hierarchy to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileView {
    /// Non-trashed children of one folder (or of the root level).
    #[default]
    All,
    /// Every starred, non-trashed item.
    Starred,
    /// Top-level trashed items.
    Trash,
}

/// Metadata of an uploaded file to register in the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    /// Display name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Location of the uploaded bytes.
    pub file_url: String,
    /// Preview location.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Target folder (`None` for root level).
    #[serde(default)]
    pub parent_id: Option<FileId>,
}

/// Manages the file/folder hierarchy of each user.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File record repository.
    file_repo: Arc<dyn FileRepository>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(file_repo: Arc<dyn FileRepository>) -> Self {
        Self { file_repo }
    }

    /// Gets one item owned by the caller.
    pub async fn get(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileRecord> {
        load_owned(self.file_repo.as_ref(), ctx, id).await
    }

    /// Lists items for a view, folders first then by name.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FileId>,
        view: FileView,
    ) -> AppResult<Vec<FileRecord>> {
        match view {
            FileView::All => {
                if let Some(parent_id) = parent_id {
                    let parent = self.get(ctx, parent_id).await?;
                    if !parent.is_folder {
                        return Err(AppError::validation("Only folders can be listed"));
                    }
                }
                self.file_repo
                    .find_children(&ctx.user_id, parent_id, false)
                    .await
            }
            FileView::Starred => self.file_repo.find_starred(&ctx.user_id).await,
            FileView::Trash => {
                let trashed = self.file_repo.find_trashed(&ctx.user_id).await?;
                let ids: HashSet<FileId> = trashed.iter().map(|r| r.id).collect();
                Ok(trashed
                    .into_iter()
                    .filter(|r| r.parent_id.is_none_or(|p| !ids.contains(&p)))
                    .collect())
            }
        }
    }

    /// Creates a folder.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<FileId>,
    ) -> AppResult<FileRecord> {
        let name = validate_name(name)?;
        let parent = self.writable_parent(ctx, parent_id).await?;

        let folder = self
            .file_repo
            .insert(CreateFileRecord {
                path: path_under(parent.as_ref(), &name),
                name,
                size: 0,
                file_type: FOLDER_TYPE.to_string(),
                file_url: String::new(),
                thumbnail_url: None,
                user_id: ctx.user_id.clone(),
                parent_id,
                is_folder: true,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %folder.id,
            path = %folder.path,
            "Folder created"
        );

        Ok(folder)
    }

    /// Registers an uploaded file.
    pub async fn create_file(
        &self,
        ctx: &RequestContext,
        req: CreateFileRequest,
    ) -> AppResult<FileRecord> {
        let name = validate_name(&req.name)?;
        if req.size < 0 {
            return Err(AppError::validation("File size cannot be negative"));
        }
        let file_type = req.file_type.trim();
        if file_type.is_empty() || file_type == FOLDER_TYPE {
            return Err(AppError::validation("A valid file type is required"));
        }
        if req.file_url.trim().is_empty() {
            return Err(AppError::validation("File URL is required"));
        }
        let parent = self.writable_parent(ctx, req.parent_id).await?;

        let file = self
            .file_repo
            .insert(CreateFileRecord {
                path: path_under(parent.as_ref(), &name),
                name,
                size: req.size,
                file_type: file_type.to_string(),
                file_url: req.file_url,
                thumbnail_url: req.thumbnail_url,
                user_id: ctx.user_id.clone(),
                parent_id: req.parent_id,
                is_folder: false,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            size = file.size,
            "File registered"
        );

        Ok(file)
    }

    /// Renames an item; paths of its descendants follow.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        id: FileId,
        name: &str,
    ) -> AppResult<FileRecord> {
        let record = self.get(ctx, id).await?;
        let name = validate_name(name)?;
        if record.name == name {
            return Ok(record);
        }

        let parent = match record.parent_id {
            Some(parent_id) => self.file_repo.find_by_id(parent_id).await?,
            None => None,
        };

        let mut subtree = self.owned_subtree(ctx, id).await?;
        if let Some(root) = subtree.iter_mut().find(|r| r.id == id) {
            root.name = name.clone();
        }
        let subtree = rebase_paths(id, subtree, path_under(parent.as_ref(), &name));

        let renamed = self.save_subtree(id, subtree).await?;
        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            old_name = %record.name,
            new_name = %renamed.name,
            "File renamed"
        );
        Ok(renamed)
    }

    /// Moves an item under another folder, or to the root level when `None`.
    pub async fn move_item(
        &self,
        ctx: &RequestContext,
        id: FileId,
        new_parent_id: Option<FileId>,
    ) -> AppResult<FileRecord> {
        let record = self.get(ctx, id).await?;
        if record.is_trash {
            return Err(AppError::validation("Restore the item before moving it"));
        }
        if new_parent_id == Some(id) {
            return Err(AppError::validation("An item cannot be moved into itself"));
        }

        self.writable_parent(ctx, new_parent_id).await?;
        if record.parent_id == new_parent_id {
            return Ok(record);
        }

        // The repository re-checks the target and acyclicity under its own lock.
        let moved = self
            .file_repo
            .reparent(id, new_parent_id)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("File not found"))?;
        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            path = %moved.path,
            "File moved"
        );
        Ok(moved)
    }

    /// Flips the starred flag.
    pub async fn toggle_star(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileRecord> {
        let mut record = self.get(ctx, id).await?;
        record.is_starred = !record.is_starred;
        self.file_repo.update(&record).await
    }

    /// Sets the shared flag.
    pub async fn set_shared(
        &self,
        ctx: &RequestContext,
        id: FileId,
        shared: bool,
    ) -> AppResult<FileRecord> {
        let mut record = self.get(ctx, id).await?;
        record.is_shared = shared;
        let record = self.file_repo.update(&record).await?;
        info!(user_id = %ctx.user_id, file_id = %id, shared, "Sharing updated");
        Ok(record)
    }

    /// Moves an item and all of its descendants to the trash.
    pub async fn trash(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileRecord> {
        let record = self.get(ctx, id).await?;
        if record.is_trash {
            return Ok(record);
        }

        let changed: Vec<FileRecord> = self
            .owned_subtree(ctx, id)
            .await?
            .into_iter()
            .filter(|r| !r.is_trash)
            .map(|mut r| {
                r.is_trash = true;
                r
            })
            .collect();
        let count = changed.len();

        let trashed = self.save_subtree(id, changed).await?;
        info!(user_id = %ctx.user_id, file_id = %id, count, "Moved to trash");
        Ok(trashed)
    }

    /// Restores an item and its descendants from the trash.
    ///
    /// When the original parent is gone or still trashed, the item lands at
    /// the root level.
    pub async fn restore(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileRecord> {
        let record = self.get(ctx, id).await?;
        if !record.is_trash {
            return Err(AppError::validation("Item is not in the trash"));
        }

        let parent_alive = match record.parent_id {
            None => true,
            Some(parent_id) => self
                .file_repo
                .find_by_id(parent_id)
                .await?
                .is_some_and(|p| ctx.owns(&p.user_id) && p.is_folder && !p.is_trash),
        };

        let mut subtree = if parent_alive {
            self.owned_subtree(ctx, id).await?
        } else {
            let mut moved = self.file_repo.reparent(id, None).await?;
            moved.retain(|r| ctx.owns(&r.user_id));
            moved
        };
        for r in &mut subtree {
            r.is_trash = false;
        }

        let restored = self.save_subtree(id, subtree).await?;
        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            to_root = !parent_alive,
            "Restored from trash"
        );
        Ok(restored)
    }

    /// Removes a trashed item and its descendants for good.
    ///
    /// Returns the removed records; their `file_url`s are the objects to purge.
    pub async fn delete_permanently(
        &self,
        ctx: &RequestContext,
        id: FileId,
    ) -> AppResult<Vec<FileRecord>> {
        let record = self.get(ctx, id).await?;
        if !record.is_trash {
            return Err(AppError::validation(
                "Only items in the trash can be deleted permanently",
            ));
        }

        let removed = self.file_repo.find_subtree(id).await?;
        let ids: Vec<FileId> = removed.iter().map(|r| r.id).collect();
        self.file_repo.delete_many(&ids).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            count = removed.len(),
            "Deleted permanently"
        );
        Ok(removed)
    }

    /// Permanently removes everything in the caller's trash.
    pub async fn empty_trash(&self, ctx: &RequestContext) -> AppResult<Vec<FileRecord>> {
        let mut removed = Vec::new();
        for item in self.list(ctx, None, FileView::Trash).await? {
            removed.extend(self.file_repo.find_subtree(item.id).await?);
        }
        if removed.is_empty() {
            return Ok(removed);
        }

        let ids: Vec<FileId> = removed.iter().map(|r| r.id).collect();
        self.file_repo.delete_many(&ids).await?;

        info!(user_id = %ctx.user_id, count = removed.len(), "Trash emptied");
        Ok(removed)
    }

    /// Resolves the target folder of a create or move.
    async fn writable_parent(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FileId>,
    ) -> AppResult<Option<FileRecord>> {
        let Some(parent_id) = parent_id else {
            return Ok(None);
        };

        let parent = self.get(ctx, parent_id).await?;
        if !parent.is_folder {
            return Err(AppError::validation("Parent must be a folder"));
        }
        if parent.is_trash {
            return Err(AppError::validation("Parent folder is in the trash"));
        }
        Ok(Some(parent))
    }

    async fn owned_subtree(&self, ctx: &RequestContext, id: FileId) -> AppResult<Vec<FileRecord>> {
        let mut subtree = self.file_repo.find_subtree(id).await?;
        subtree.retain(|r| ctx.owns(&r.user_id));
        Ok(subtree)
    }

    async fn save_subtree(&self, id: FileId, records: Vec<FileRecord>) -> AppResult<FileRecord> {
        self.file_repo
            .update_many(&records)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if name.contains('/') {
        return Err(AppError::validation("Name cannot contain '/'"));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("Name cannot be '.' or '..'"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn path_under(parent: Option<&FileRecord>, name: &str) -> String {
    parent
        .map(|p| p.child_path(name))
        .unwrap_or_else(|| FileRecord::root_path(name))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytecloud_core::error::ErrorKind;
    use bytecloud_database::MemoryFileRepository;

    use super::*;

    /// Yields before every lookup so that concurrent calls interleave between
    /// their reads and their writes.
    #[derive(Debug, Default)]
    struct InterleavingRepo(MemoryFileRepository);

    #[async_trait]
    impl FileRepository for InterleavingRepo {
        async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileRecord>> {
            tokio::task::yield_now().await;
            self.0.find_by_id(id).await
        }

        async fn find_children(
            &self,
            user_id: &str,
            parent_id: Option<FileId>,
            include_trash: bool,
        ) -> AppResult<Vec<FileRecord>> {
            self.0.find_children(user_id, parent_id, include_trash).await
        }

        async fn find_starred(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
            self.0.find_starred(user_id).await
        }

        async fn find_trashed(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
            self.0.find_trashed(user_id).await
        }

        async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
            self.0.find_by_user(user_id).await
        }

        async fn find_subtree(&self, id: FileId) -> AppResult<Vec<FileRecord>> {
            tokio::task::yield_now().await;
            self.0.find_subtree(id).await
        }

        async fn find_ancestors(&self, id: FileId) -> AppResult<Vec<FileRecord>> {
            tokio::task::yield_now().await;
            self.0.find_ancestors(id).await
        }

        async fn insert(&self, data: CreateFileRecord) -> AppResult<FileRecord> {
            self.0.insert(data).await
        }

        async fn update_many(&self, records: &[FileRecord]) -> AppResult<Vec<FileRecord>> {
            self.0.update_many(records).await
        }

        async fn reparent(
            &self,
            id: FileId,
            new_parent_id: Option<FileId>,
        ) -> AppResult<Vec<FileRecord>> {
            self.0.reparent(id, new_parent_id).await
        }

        async fn delete_many(&self, ids: &[FileId]) -> AppResult<u64> {
            self.0.delete_many(ids).await
        }

        async fn health_check(&self) -> AppResult<bool> {
            self.0.health_check().await
        }
    }

    fn service() -> FileService {
        FileService::new(Arc::new(MemoryFileRepository::new()))
    }

    fn alice() -> RequestContext {
        RequestContext::new("user_alice", "sess_alice")
    }

    fn bob() -> RequestContext {
        RequestContext::new("user_bob", "sess_bob")
    }

    fn upload(name: &str, parent_id: Option<FileId>) -> CreateFileRequest {
        CreateFileRequest {
            name: name.to_string(),
            size: 1024,
            file_type: "application/pdf".to_string(),
            file_url: format!("https://cdn.example.com/{name}"),
            thumbnail_url: None,
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_create_folder_and_nested_file() {
        let svc = service();
        let ctx = alice();

        let docs = svc.create_folder(&ctx, "docs", None).await.unwrap();
        assert!(docs.is_root() && docs.is_folder);
        assert_eq!(docs.path, "/docs");
        assert_eq!(docs.file_type, FOLDER_TYPE);
        assert_eq!(docs.size, 0);

        let report = svc
            .create_file(&ctx, upload("report.pdf", Some(docs.id)))
            .await
            .unwrap();
        assert_eq!(report.path, "/docs/report.pdf");
        assert_eq!(report.parent_id, Some(docs.id));
        assert!(!report.is_folder);
    }

    #[tokio::test]
    async fn test_parent_must_be_an_owned_folder() {
        let svc = service();
        let ctx = alice();
        let file = svc.create_file(&ctx, upload("a.pdf", None)).await.unwrap();

        let err = svc.create_folder(&ctx, "x", Some(file.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = svc
            .create_folder(&ctx, "x", Some(FileId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let foreign = svc.create_folder(&bob(), "bob", None).await.unwrap();
        let err = svc.create_folder(&ctx, "x", Some(foreign.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_name_rules() {
        let svc = service();
        let ctx = alice();
        let long = "x".repeat(256);
        for bad in ["", "   ", "a/b", "..", long.as_str()] {
            let err = svc.create_folder(&ctx, bad, None).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "name {bad:?}");
        }
        let ok = svc.create_folder(&ctx, "  spaced  ", None).await.unwrap();
        assert_eq!(ok.name, "spaced");
    }

    #[tokio::test]
    async fn test_items_of_other_users_are_invisible() {
        let svc = service();
        let folder = svc.create_folder(&alice(), "private", None).await.unwrap();

        let err = svc.get(&bob(), folder.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(svc.list(&bob(), None, FileView::All).await.unwrap().is_empty());
        assert_eq!(
            svc.trash(&bob(), folder.id).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_rename_updates_descendant_paths() {
        let svc = service();
        let ctx = alice();
        let docs = svc.create_folder(&ctx, "docs", None).await.unwrap();
        let work = svc.create_folder(&ctx, "work", Some(docs.id)).await.unwrap();
        let report = svc
            .create_file(&ctx, upload("report.pdf", Some(work.id)))
            .await
            .unwrap();

        let renamed = svc.rename(&ctx, docs.id, "archive").await.unwrap();
        assert_eq!(renamed.path, "/archive");
        assert_eq!(svc.get(&ctx, work.id).await.unwrap().path, "/archive/work");
        assert_eq!(
            svc.get(&ctx, report.id).await.unwrap().path,
            "/archive/work/report.pdf"
        );
    }

    #[tokio::test]
    async fn test_move_rejects_cycles() {
        let svc = service();
        let ctx = alice();
        let a = svc.create_folder(&ctx, "a", None).await.unwrap();
        let b = svc.create_folder(&ctx, "b", Some(a.id)).await.unwrap();
        let c = svc.create_folder(&ctx, "c", Some(b.id)).await.unwrap();

        let err = svc.move_item(&ctx, a.id, Some(a.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = svc.move_item(&ctx, a.id, Some(c.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(svc.get(&ctx, a.id).await.unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn test_move_recomputes_paths() {
        let svc = service();
        let ctx = alice();
        let a = svc.create_folder(&ctx, "a", None).await.unwrap();
        let b = svc.create_folder(&ctx, "b", None).await.unwrap();
        let file = svc.create_file(&ctx, upload("f.pdf", Some(b.id))).await.unwrap();

        let moved = svc.move_item(&ctx, b.id, Some(a.id)).await.unwrap();
        assert_eq!(moved.parent_id, Some(a.id));
        assert_eq!(moved.path, "/a/b");
        assert_eq!(svc.get(&ctx, file.id).await.unwrap().path, "/a/b/f.pdf");

        let back = svc.move_item(&ctx, b.id, None).await.unwrap();
        assert!(back.is_root());
        assert_eq!(svc.get(&ctx, file.id).await.unwrap().path, "/b/f.pdf");
    }

    #[tokio::test]
    async fn test_opposing_concurrent_moves_keep_the_tree_acyclic() {
        let svc = FileService::new(Arc::new(InterleavingRepo::default()));
        let ctx = alice();
        let a = svc.create_folder(&ctx, "a", None).await.unwrap();
        let b = svc.create_folder(&ctx, "b", None).await.unwrap();

        let (first, second) = tokio::join!(
            svc.move_item(&ctx, a.id, Some(b.id)),
            svc.move_item(&ctx, b.id, Some(a.id)),
        );
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let err = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(err.kind, ErrorKind::Validation);

        let a = svc.get(&ctx, a.id).await.unwrap();
        let b = svc.get(&ctx, b.id).await.unwrap();
        let (top, nested) = if a.is_root() { (a, b) } else { (b, a) };
        assert!(top.is_root());
        assert_eq!(nested.parent_id, Some(top.id));
        assert_eq!(nested.path, format!("{}/{}", top.path, nested.name));
    }

    #[tokio::test]
    async fn test_trash_cascades_and_views() {
        let svc = service();
        let ctx = alice();
        let docs = svc.create_folder(&ctx, "docs", None).await.unwrap();
        let inner = svc.create_file(&ctx, upload("in.pdf", Some(docs.id))).await.unwrap();
        let loose = svc.create_file(&ctx, upload("loose.pdf", None)).await.unwrap();
        svc.toggle_star(&ctx, loose.id).await.unwrap();
        svc.toggle_star(&ctx, inner.id).await.unwrap();

        svc.trash(&ctx, docs.id).await.unwrap();
        assert!(svc.get(&ctx, inner.id).await.unwrap().is_trash);

        let all = svc.list(&ctx, None, FileView::All).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![loose.id]);

        let starred = svc.list(&ctx, None, FileView::Starred).await.unwrap();
        assert_eq!(starred.iter().map(|r| r.id).collect::<Vec<_>>(), vec![loose.id]);

        let trash = svc.list(&ctx, None, FileView::Trash).await.unwrap();
        assert_eq!(trash.iter().map(|r| r.id).collect::<Vec<_>>(), vec![docs.id]);

        let err = svc.create_folder(&ctx, "x", Some(docs.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_restore_returns_subtree() {
        let svc = service();
        let ctx = alice();
        let docs = svc.create_folder(&ctx, "docs", None).await.unwrap();
        let inner = svc.create_file(&ctx, upload("in.pdf", Some(docs.id))).await.unwrap();

        svc.trash(&ctx, docs.id).await.unwrap();
        let restored = svc.restore(&ctx, docs.id).await.unwrap();
        assert!(!restored.is_trash);
        assert!(!svc.get(&ctx, inner.id).await.unwrap().is_trash);

        let err = svc.restore(&ctx, docs.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_restore_under_trashed_parent_goes_to_root() {
        let svc = service();
        let ctx = alice();
        let docs = svc.create_folder(&ctx, "docs", None).await.unwrap();
        let work = svc.create_folder(&ctx, "work", Some(docs.id)).await.unwrap();
        let file = svc.create_file(&ctx, upload("f.pdf", Some(work.id))).await.unwrap();

        svc.trash(&ctx, docs.id).await.unwrap();
        let restored = svc.restore(&ctx, work.id).await.unwrap();

        assert!(restored.is_root());
        assert_eq!(restored.path, "/work");
        let file = svc.get(&ctx, file.id).await.unwrap();
        assert_eq!(file.path, "/work/f.pdf");
        assert!(!file.is_trash);
        assert!(svc.get(&ctx, docs.id).await.unwrap().is_trash);
    }

    #[tokio::test]
    async fn test_permanent_delete_requires_trash() {
        let svc = service();
        let ctx = alice();
        let docs = svc.create_folder(&ctx, "docs", None).await.unwrap();
        let inner = svc.create_file(&ctx, upload("in.pdf", Some(docs.id))).await.unwrap();

        let err = svc.delete_permanently(&ctx, docs.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        svc.trash(&ctx, docs.id).await.unwrap();
        let removed = svc.delete_permanently(&ctx, docs.id).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().any(|r| r.file_url == inner.file_url));
        assert_eq!(
            svc.get(&ctx, inner.id).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_empty_trash() {
        let svc = service();
        let ctx = alice();
        let a = svc.create_folder(&ctx, "a", None).await.unwrap();
        svc.create_file(&ctx, upload("x.pdf", Some(a.id))).await.unwrap();
        let b = svc.create_file(&ctx, upload("b.pdf", None)).await.unwrap();
        let keep = svc.create_file(&ctx, upload("keep.pdf", None)).await.unwrap();
        svc.trash(&ctx, a.id).await.unwrap();
        svc.trash(&ctx, b.id).await.unwrap();

        assert_eq!(svc.empty_trash(&ctx).await.unwrap().len(), 3);
        assert!(svc.list(&ctx, None, FileView::Trash).await.unwrap().is_empty());
        assert!(svc.get(&ctx, keep.id).await.is_ok());
        assert!(svc.empty_trash(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_advance_updated_at_and_reads_do_not() {
        let svc = service();
        let ctx = alice();
        let file = svc.create_file(&ctx, upload("a.pdf", None)).await.unwrap();

        let read = svc.get(&ctx, file.id).await.unwrap();
        assert_eq!(read, file);

        let starred = svc.toggle_star(&ctx, file.id).await.unwrap();
        assert!(starred.is_starred);
        assert!(starred.updated_at > file.updated_at);

        let shared = svc.set_shared(&ctx, file.id, true).await.unwrap();
        assert!(shared.is_shared);
        assert!(shared.updated_at > starred.updated_at);
        assert_eq!(shared.created_at, file.created_at);
    }

    #[test]
    fn test_create_file_request_json() {
        let req: CreateFileRequest = serde_json::from_str(
            r#"{"name":"a.png","size":3,"type":"image/png","fileUrl":"u"}"#,
        )
        .unwrap();
        assert_eq!(req.file_type, "image/png");
        assert!(req.parent_id.is_none());
    }
}
