//! Integration tests driving the HTTP API in-process.

mod helpers;

mod auth_test;
mod files_test;
