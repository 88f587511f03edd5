//! ByteCloud Server: cloud drive backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use bytecloud_auth::{HttpIdentityProvider, IdentityProvider};
use bytecloud_core::config::{AppConfig, LogFormat, StorageBackend};
use bytecloud_database::{DatabasePool, FileRepository, MemoryFileRepository};

/// ByteCloud HTTP server.
#[derive(Debug, Parser)]
#[command(name = "bytecloud-server", version, about)]
struct Cli {
    /// Extra configuration file merged over `config/default` and `config/{env}`.
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<String>,

    /// Environment name selecting `config/{env}`.
    #[arg(short, long, env = "BYTECLOUD_ENV", default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref(), &cli.env)
        .context("Failed to load configuration")?;

    init_logging(&config);
    tracing::info!(env = %cli.env, "Starting ByteCloud v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        return Err(e);
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    // ── Step 1: File record storage ──────────────────────────────
    let (file_repo, db_pool): (Arc<dyn FileRepository>, Option<DatabasePool>) =
        match config.storage.backend {
            StorageBackend::Postgres => {
                tracing::info!("Connecting to database...");
                let db_pool = DatabasePool::connect(&config.database).await?;
                bytecloud_database::migration::run_migrations(db_pool.pool()).await?;
                (Arc::new(db_pool.file_repository()), Some(db_pool))
            }
            StorageBackend::Memory => {
                if config.server.is_production() {
                    anyhow::bail!("storage.backend = \"memory\" is not allowed in production");
                }
                tracing::warn!("Using in-memory file storage; records are lost on restart");
                (Arc::new(MemoryFileRepository::new()), None)
            }
        };

    // ── Step 2: Identity provider ────────────────────────────────
    let provider: Arc<dyn IdentityProvider> = Arc::new(HttpIdentityProvider::new(&config.auth)?);

    // ── Step 3: HTTP server ──────────────────────────────────────
    let result = bytecloud_api::run_server(config, file_repo, provider).await;

    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }
    result.map_err(Into::into)
}
