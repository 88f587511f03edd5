//! In-memory file record repository.
//!
//! Records live in an arena keyed by id. The parent→children index is a
//! derived view, rebuilt incrementally on every insert, update and delete.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use bytecloud_core::error::AppError;
use bytecloud_core::result::AppResult;
use bytecloud_core::types::FileId;
use bytecloud_entity::file::{CreateFileRecord, FileRecord, rebase_paths};

use super::{FileRepository, ensure_reparent_target};

#[derive(Debug, Default)]
struct Arena {
    records: HashMap<FileId, FileRecord>,
    children: HashMap<Option<FileId>, BTreeSet<FileId>>,
}

impl Arena {
    fn link(&mut self, record: &FileRecord) {
        self.children
            .entry(record.parent_id)
            .or_default()
            .insert(record.id);
    }

    fn unlink(&mut self, record: &FileRecord) {
        if let Some(siblings) = self.children.get_mut(&record.parent_id) {
            siblings.remove(&record.id);
            if siblings.is_empty() {
                self.children.remove(&record.parent_id);
            }
        }
    }

    fn child_ids(&self, parent: Option<FileId>) -> impl Iterator<Item = &FileId> {
        self.children.get(&parent).into_iter().flatten()
    }

    fn subtree(&self, id: FileId) -> Vec<FileRecord> {
        let Some(root) = self.records.get(&id) else {
            return Vec::new();
        };

        let mut out = vec![root.clone()];
        let mut seen = HashSet::from([id]);
        let mut level = vec![id];
        while !level.is_empty() {
            let mut next = Vec::new();
            for parent in level {
                for child in self.child_ids(Some(parent)) {
                    if seen.insert(*child) {
                        next.push(*child);
                    }
                }
            }
            let mut records: Vec<FileRecord> =
                next.iter().filter_map(|c| self.records.get(c)).cloned().collect();
            sort_listing(&mut records);
            out.extend(records);
            level = next;
        }
        out
    }

    fn ancestors(&self, id: FileId) -> Vec<FileRecord> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.records.get(&id).and_then(|r| r.parent_id);

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.records.get(&parent_id) else {
                break;
            };
            chain.push(parent.clone());
            current = parent.parent_id;
        }
        chain
    }

    /// Writes the mutable fields of `records`, which must all exist. The parent
    /// link is only taken over when `relink` is set.
    fn store(&mut self, records: &[FileRecord], relink: bool) -> Vec<FileRecord> {
        let now = Utc::now();
        let mut updated = Vec::with_capacity(records.len());
        for incoming in records {
            let Some(previous) = self.records.get(&incoming.id).cloned() else {
                continue;
            };

            let mut stored = previous.clone();
            stored.name = incoming.name.clone();
            stored.path = incoming.path.clone();
            if relink {
                stored.parent_id = incoming.parent_id;
            }
            stored.thumbnail_url = incoming.thumbnail_url.clone();
            stored.is_starred = incoming.is_starred;
            stored.is_trash = incoming.is_trash;
            stored.is_shared = incoming.is_shared;
            stored.touch(now);

            if previous.parent_id != stored.parent_id {
                self.unlink(&previous);
                self.link(&stored);
            }
            self.records.insert(stored.id, stored.clone());
            updated.push(stored);
        }
        updated
    }

    fn collect(&self, filter: impl Fn(&FileRecord) -> bool) -> Vec<FileRecord> {
        let mut out: Vec<FileRecord> = self.records.values().filter(|r| filter(r)).cloned().collect();
        sort_listing(&mut out);
        out
    }
}

fn sort_listing(records: &mut [FileRecord]) {
    records.sort_by(|a, b| {
        b.is_folder
            .cmp(&a.is_folder)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
    });
}

/// Process-local repository used for development and tests.
#[derive(Debug, Default)]
pub struct MemoryFileRepository {
    arena: RwLock<Arena>,
}

impl MemoryFileRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.arena.read().await.records.len()
    }

    /// Whether the repository holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileRecord>> {
        Ok(self.arena.read().await.records.get(&id).cloned())
    }

    async fn find_children(
        &self,
        user_id: &str,
        parent_id: Option<FileId>,
        include_trash: bool,
    ) -> AppResult<Vec<FileRecord>> {
        let arena = self.arena.read().await;
        let mut out: Vec<FileRecord> = arena
            .child_ids(parent_id)
            .filter_map(|id| arena.records.get(id))
            .filter(|r| r.user_id == user_id && (include_trash || !r.is_trash))
            .cloned()
            .collect();
        sort_listing(&mut out);
        Ok(out)
    }

    async fn find_starred(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
        let arena = self.arena.read().await;
        Ok(arena.collect(|r| r.user_id == user_id && r.is_starred && !r.is_trash))
    }

    async fn find_trashed(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
        let arena = self.arena.read().await;
        Ok(arena.collect(|r| r.user_id == user_id && r.is_trash))
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
        let arena = self.arena.read().await;
        Ok(arena.collect(|r| r.user_id == user_id))
    }

    async fn find_subtree(&self, id: FileId) -> AppResult<Vec<FileRecord>> {
        Ok(self.arena.read().await.subtree(id))
    }

    async fn find_ancestors(&self, id: FileId) -> AppResult<Vec<FileRecord>> {
        Ok(self.arena.read().await.ancestors(id))
    }

    async fn insert(&self, data: CreateFileRecord) -> AppResult<FileRecord> {
        let mut arena = self.arena.write().await;
        if let Some(parent_id) = data.parent_id {
            if !arena.records.contains_key(&parent_id) {
                return Err(AppError::not_found("Parent folder not found"));
            }
        }

        let record = data.into_record(Utc::now());
        arena.link(&record);
        arena.records.insert(record.id, record.clone());
        debug!(file_id = %record.id, "Inserted record into memory arena");
        Ok(record)
    }

    async fn update_many(&self, records: &[FileRecord]) -> AppResult<Vec<FileRecord>> {
        let mut arena = self.arena.write().await;
        if let Some(missing) = records.iter().find(|r| !arena.records.contains_key(&r.id)) {
            return Err(AppError::not_found(format!("File {} not found", missing.id)));
        }
        Ok(arena.store(records, false))
    }

    async fn reparent(
        &self,
        id: FileId,
        new_parent_id: Option<FileId>,
    ) -> AppResult<Vec<FileRecord>> {
        let mut arena = self.arena.write().await;
        let moved = arena
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;

        let root_path = match new_parent_id {
            None => FileRecord::root_path(&moved.name),
            Some(parent_id) => {
                let parent = arena
                    .records
                    .get(&parent_id)
                    .ok_or_else(|| AppError::not_found("Parent folder not found"))?;
                ensure_reparent_target(&moved, parent, arena.ancestors(parent_id))?;
                parent.child_path(&moved.name)
            }
        };

        let mut subtree = rebase_paths(id, arena.subtree(id), root_path);
        if let Some(root) = subtree.iter_mut().find(|r| r.id == id) {
            root.parent_id = new_parent_id;
        }
        let updated = arena.store(&subtree, true);
        debug!(file_id = %id, count = updated.len(), "Re-parented subtree in memory arena");
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[FileId]) -> AppResult<u64> {
        let mut arena = self.arena.write().await;
        let mut removed = 0;
        for id in ids {
            if let Some(record) = arena.records.remove(id) {
                arena.unlink(&record);
                removed += 1;
            }
        }

        // Match the ON DELETE CASCADE of the SQL schema.
        let mut orphans: Vec<FileId> = ids
            .iter()
            .flat_map(|id| arena.child_ids(Some(*id)).copied().collect::<Vec<_>>())
            .collect();
        while let Some(orphan) = orphans.pop() {
            if let Some(record) = arena.records.remove(&orphan) {
                arena.unlink(&record);
                orphans.extend(arena.child_ids(Some(orphan)).copied());
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
