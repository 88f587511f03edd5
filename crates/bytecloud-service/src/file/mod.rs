//! File and folder hierarchy services.

pub mod service;
pub mod tree;

use bytecloud_core::error::AppError;
use bytecloud_core::result::AppResult;
use bytecloud_core::types::FileId;
use bytecloud_database::FileRepository;
use bytecloud_entity::file::FileRecord;

use crate::context::RequestContext;

pub use service::{CreateFileRequest, FileService, FileView};
pub use tree::{Breadcrumb, TreeService};

/// Load a record owned by the caller. Records of other users are reported as missing.
pub(crate) async fn load_owned(
    repo: &dyn FileRepository,
    ctx: &RequestContext,
    id: FileId,
) -> AppResult<FileRecord> {
    repo.find_by_id(id)
        .await?
        .filter(|record| ctx.owns(&record.user_id))
        .ok_or_else(|| AppError::not_found("File not found"))
}
