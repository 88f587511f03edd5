//! # bytecloud-database
//!
//! PostgreSQL connection management and the file record repositories:
//! a sqlx-backed implementation and an in-memory arena used for
//! development and tests.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{FileRepository, MemoryFileRepository, PgFileRepository};
