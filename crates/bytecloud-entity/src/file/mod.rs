//! File and folder entities.

pub mod model;
pub mod tree;

pub use model::{CreateFileRecord, FOLDER_TYPE, FileRecord};
pub use tree::{FileForest, FileNode, FileTree, rebase_paths};
