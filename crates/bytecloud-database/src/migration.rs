//! Embedded schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use bytecloud_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every migration under `migrations/` that the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to run migrations", e)
    })?;

    info!(known = MIGRATOR.migrations.len(), "Database schema up to date");
    Ok(())
}
