//! PostgreSQL file record repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use bytecloud_core::error::{AppError, ErrorKind};
use bytecloud_core::result::AppResult;
use bytecloud_core::types::FileId;
use bytecloud_entity::file::{CreateFileRecord, FileRecord, rebase_paths};

use super::{FileRepository, ensure_reparent_target};

/// Ordering shared by every listing.
const LIST_ORDER: &str = "ORDER BY is_folder DESC, lower(name) ASC, id ASC";

/// Recursion guard for ancestor/descendant queries.
const MAX_TREE_DEPTH: i32 = 1024;

/// `$1` followed by its descendants, level by level.
const SUBTREE_SQL: &str = "WITH RECURSIVE tree AS ( \
        SELECT f.*, 0 AS lvl FROM files f WHERE f.id = $1 \
        UNION ALL \
        SELECT f.*, t.lvl + 1 FROM files f INNER JOIN tree t ON f.parent_id = t.id \
        WHERE t.lvl < $2 \
     ) SELECT * FROM tree ORDER BY lvl ASC, is_folder DESC, lower(name) ASC";

/// Ancestors of `$1`, nearest first.
const ANCESTORS_SQL: &str = "WITH RECURSIVE ancestors AS ( \
        SELECT p.*, 1 AS lvl FROM files c INNER JOIN files p ON p.id = c.parent_id \
        WHERE c.id = $1 \
        UNION ALL \
        SELECT p.*, a.lvl + 1 FROM files p INNER JOIN ancestors a ON p.id = a.parent_id \
        WHERE a.lvl < $2 AND p.id <> $1 \
     ) SELECT * FROM ancestors ORDER BY lvl ASC";

/// Bumps `updated_at` strictly past its previous value.
const TOUCH: &str =
    "updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')";

/// Repository for file records stored in the `files` table.
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list(&self, filter: &str, user_id: &str, context: &str) -> AppResult<Vec<FileRecord>> {
        let sql = format!("SELECT * FROM files WHERE user_id = $1 AND {filter} {LIST_ORDER}");
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, context.to_string(), e))
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn find_children(
        &self,
        user_id: &str,
        parent_id: Option<FileId>,
        include_trash: bool,
    ) -> AppResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT * FROM files WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             AND ($3 OR NOT is_trash) {LIST_ORDER}"
        );
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(user_id)
            .bind(parent_id)
            .bind(include_trash)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn find_starred(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
        self.list("is_starred AND NOT is_trash", user_id, "Failed to list starred files")
            .await
    }

    async fn find_trashed(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
        self.list("is_trash", user_id, "Failed to list trash").await
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<FileRecord>> {
        self.list("TRUE", user_id, "Failed to list files").await
    }

    async fn find_subtree(&self, id: FileId) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(SUBTREE_SQL)
            .bind(id)
            .bind(MAX_TREE_DEPTH)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load subtree", e))
    }

    async fn find_ancestors(&self, id: FileId) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(ANCESTORS_SQL)
            .bind(id)
            .bind(MAX_TREE_DEPTH)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ancestors", e))
    }

    async fn insert(&self, data: CreateFileRecord) -> AppResult<FileRecord> {
        sqlx::query_as::<_, FileRecord>(
            "INSERT INTO files (name, path, size, type, file_url, thumbnail_url, user_id, \
             parent_id, is_folder) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.path)
        .bind(data.size)
        .bind(&data.file_type)
        .bind(&data.file_url)
        .bind(&data.thumbnail_url)
        .bind(&data.user_id)
        .bind(data.parent_id)
        .bind(data.is_folder)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::not_found("Parent folder not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })
    }

    async fn update_many(&self, records: &[FileRecord]) -> AppResult<Vec<FileRecord>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let sql = format!(
            "UPDATE files SET name = $2, path = $3, thumbnail_url = $4, is_starred = $5, \
             is_trash = $6, is_shared = $7, {TOUCH} WHERE id = $1 RETURNING *"
        );
        let mut updated = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query_as::<_, FileRecord>(&sql)
                .bind(record.id)
                .bind(&record.name)
                .bind(&record.path)
                .bind(&record.thumbnail_url)
                .bind(record.is_starred)
                .bind(record.is_trash)
                .bind(record.is_shared)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to update file", e)
                })?
                .ok_or_else(|| AppError::not_found(format!("File {} not found", record.id)))?;
            updated.push(row);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit file update", e)
        })?;

        Ok(updated)
    }

    async fn reparent(
        &self,
        id: FileId,
        new_parent_id: Option<FileId>,
    ) -> AppResult<Vec<FileRecord>> {
        let db_err = |context: &'static str| {
            move |e: sqlx::Error| AppError::with_source(ErrorKind::Database, context, e)
        };
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let owner = sqlx::query_scalar::<_, String>("SELECT user_id FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err("Failed to find file"))?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;

        // Links never cross owners, so one lock per owner serializes every
        // re-parent that could close a loop with this one.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&owner)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to lock owner tree"))?;

        let subtree = sqlx::query_as::<_, FileRecord>(SUBTREE_SQL)
            .bind(id)
            .bind(MAX_TREE_DEPTH)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to load subtree"))?;
        let moved = subtree
            .first()
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;

        let root_path = match new_parent_id {
            None => FileRecord::root_path(&moved.name),
            Some(parent_id) => {
                let parent =
                    sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
                        .bind(parent_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(db_err("Failed to find parent folder"))?
                        .ok_or_else(|| AppError::not_found("Parent folder not found"))?;
                let ancestors = sqlx::query_as::<_, FileRecord>(ANCESTORS_SQL)
                    .bind(parent_id)
                    .bind(MAX_TREE_DEPTH)
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(db_err("Failed to find ancestors"))?;
                ensure_reparent_target(&moved, &parent, ancestors)?;
                parent.child_path(&moved.name)
            }
        };

        let mut subtree = rebase_paths(id, subtree, root_path);
        if let Some(root) = subtree.first_mut() {
            root.parent_id = new_parent_id;
        }

        let sql =
            format!("UPDATE files SET path = $2, parent_id = $3, {TOUCH} WHERE id = $1 RETURNING *");
        let mut updated = Vec::with_capacity(subtree.len());
        for record in &subtree {
            let row = sqlx::query_as::<_, FileRecord>(&sql)
                .bind(record.id)
                .bind(&record.path)
                .bind(record.parent_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err("Failed to move file"))?;
            updated.push(row);
        }

        tx.commit().await.map_err(db_err("Failed to commit move"))?;
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[FileId]) -> AppResult<u64> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let result = sqlx::query("DELETE FROM files WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
