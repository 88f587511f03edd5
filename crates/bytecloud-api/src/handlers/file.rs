//! File and folder hierarchy handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use bytecloud_core::types::{FileId, PageResponse};
use bytecloud_entity::file::{FileRecord, FileTree};
use bytecloud_service::{Breadcrumb, CreateFileRequest};

use crate::dto::request::{
    CreateFolderRequest, ListFilesQuery, MoveRequest, RenameRequest, ShareRequest, TreeQuery,
    validate_body,
};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

/// GET /api/files?parentId=...&view=all|starred|trash
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ListFilesQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<FileRecord>>>> {
    let items = state
        .file_service
        .list(&auth, filter.parent_id, filter.view)
        .await?;
    let page = params.into_page_request();

    Ok(Json(ApiResponse::ok(PageResponse::from_all(items, &page))))
}

/// POST /api/files
pub async fn create_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFileRequest>,
) -> ApiResult<Created<FileRecord>> {
    let file = state.file_service.create_file(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(file))))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> ApiResult<Created<FileRecord>> {
    validate_body(&req)?;
    let folder = state
        .file_service
        .create_folder(&auth, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    let file = state.file_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PATCH /api/files/{id}
pub async fn rename(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    validate_body(&req)?;
    let file = state.file_service.rename(&auth, id, &req.name).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}/move
pub async fn move_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    let file = state
        .file_service
        .move_item(&auth, id, req.parent_id)
        .await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// POST /api/files/{id}/star
pub async fn toggle_star(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    let file = state.file_service.toggle_star(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}/share
pub async fn set_shared(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    let file = state.file_service.set_shared(&auth, id, req.shared).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// POST /api/files/{id}/trash
pub async fn trash(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    let file = state.file_service.trash(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// POST /api/files/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<FileRecord>>> {
    let file = state.file_service.restore(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// DELETE /api/files/{id}
///
/// Returns the removed records; their `fileUrl`s are the storage keys to purge.
pub async fn delete_permanently(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<Vec<FileRecord>>>> {
    let removed = state.file_service.delete_permanently(&auth, id).await?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// DELETE /api/trash
pub async fn empty_trash(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<FileRecord>>>> {
    let removed = state.file_service.empty_trash(&auth).await?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// GET /api/files/tree?rootId=...
pub async fn tree(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TreeQuery>,
) -> ApiResult<Json<ApiResponse<FileTree>>> {
    let tree = state.tree_service.get_tree(&auth, query.root_id).await?;
    Ok(Json(ApiResponse::ok(tree)))
}

/// GET /api/files/{id}/breadcrumbs
pub async fn breadcrumbs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<Vec<Breadcrumb>>>> {
    let crumbs = state.tree_service.breadcrumbs(&auth, id).await?;
    Ok(Json(ApiResponse::ok(crumbs)))
}
