//! Nested tree views and breadcrumb resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use bytecloud_core::result::AppResult;
use bytecloud_core::types::FileId;
use bytecloud_database::FileRepository;
use bytecloud_entity::file::{FileForest, FileTree};

use super::load_owned;
use crate::context::RequestContext;

/// One step of the root → item chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    /// Record ID.
    pub id: FileId,
    /// Display name.
    pub name: String,
    /// Full path.
    pub path: String,
}

/// Builds file trees and resolves paths.
#[derive(Debug, Clone)]
pub struct TreeService {
    /// File record repository.
    file_repo: Arc<dyn FileRepository>,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(file_repo: Arc<dyn FileRepository>) -> Self {
        Self { file_repo }
    }

    /// Builds the tree below `root_id`, or the caller's whole hierarchy.
    ///
    /// Trashed records are left out unless the requested root is itself trashed.
    pub async fn get_tree(
        &self,
        ctx: &RequestContext,
        root_id: Option<FileId>,
    ) -> AppResult<FileTree> {
        let Some(root_id) = root_id else {
            let records = self.file_repo.find_by_user(&ctx.user_id).await?;
            let forest = FileForest::new(records.into_iter().filter(|r| !r.is_trash));
            return Ok(forest.tree(None));
        };

        let root = load_owned(self.file_repo.as_ref(), ctx, root_id).await?;
        let include_trash = root.is_trash;
        let records = self.file_repo.find_subtree(root_id).await?;
        let forest = FileForest::new(
            records
                .into_iter()
                .filter(|r| ctx.owns(&r.user_id) && (include_trash || !r.is_trash)),
        );
        Ok(forest.tree(Some(root_id)))
    }

    /// Root → item chain, the item last.
    pub async fn breadcrumbs(&self, ctx: &RequestContext, id: FileId) -> AppResult<Vec<Breadcrumb>> {
        let record = load_owned(self.file_repo.as_ref(), ctx, id).await?;
        let mut chain = self.file_repo.find_ancestors(id).await?;
        chain.reverse();
        chain.push(record);

        Ok(chain
            .into_iter()
            .filter(|r| ctx.owns(&r.user_id))
            .map(|r| Breadcrumb {
                id: r.id,
                name: r.name,
                path: r.path,
            })
            .collect())
    }
}
