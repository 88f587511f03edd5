//! Convenience result type alias for ByteCloud.

use crate::error::AppError;

/// A specialized `Result` type for ByteCloud operations.
pub type AppResult<T> = Result<T, AppError>;
