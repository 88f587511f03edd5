//! # bytecloud-service
//!
//! Business logic service layer for ByteCloud. Services orchestrate the
//! file repository and enforce the hierarchy rules the schema cannot:
//! folder-only parents, acyclicity, single ownership, trash cascading.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod file;

pub use context::RequestContext;
pub use file::{Breadcrumb, CreateFileRequest, FileService, FileView, TreeService};
