//! # bytecloud-entity
//!
//! Domain entity models for ByteCloud. A single persisted entity, the
//! file/folder record, forms a forest through its nullable parent link.
//! Database rows derive `sqlx::FromRow`; tree views are built in memory.

pub mod file;
