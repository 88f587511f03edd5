//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use bytecloud_core::error::AppError;
use bytecloud_core::types::FileId;
use bytecloud_service::FileView;

/// Verification code submitted for a pending sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    /// Code from the verification email.
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Parent folder (`None` for root level).
    #[serde(default)]
    pub parent_id: Option<FileId>,
}

/// Rename request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Move request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Target folder; `null` moves to root level.
    #[serde(default)]
    pub parent_id: Option<FileId>,
}

/// Share toggle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    /// New shared flag.
    pub shared: bool,
}

/// Query of `GET /files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    /// Folder to list; root level when absent.
    pub parent_id: Option<FileId>,
    /// Which slice of the hierarchy.
    #[serde(default)]
    pub view: FileView,
}

/// Query of `GET /files/tree`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeQuery {
    /// Subtree root; the whole hierarchy when absent.
    pub root_id: Option<FileId>,
}

/// Run `validator` rules and convert a failure into a validation error.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(|e| {
        let details = serde_json::to_value(e.field_errors()).unwrap_or_default();
        AppError::validation("Invalid request body").with_details(details)
    })
}
