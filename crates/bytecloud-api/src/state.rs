//! Application state shared across all handlers and middleware.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytecloud_auth::provider::ProviderResult;
use bytecloud_auth::{IdentityProvider, ProviderError, SessionGate, SignUpRegistry, SignUpSettings};
use bytecloud_core::config::AppConfig;
use bytecloud_core::result::AppResult;
use bytecloud_database::FileRepository;
use bytecloud_service::{FileService, TreeService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped or cheap handles, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// File record repository (PostgreSQL or in-memory)
    pub file_repo: Arc<dyn FileRepository>,

    // ── Auth ─────────────────────────────────────────────────
    /// External identity provider
    pub provider: Arc<dyn IdentityProvider>,
    /// Readiness of the session layer
    pub gate: SessionGate,
    /// Pending sign-up flows keyed by provider sign-up id
    pub sign_ups: Arc<SignUpRegistry>,
    /// Settings every new sign-up flow starts with
    pub sign_up_settings: SignUpSettings,

    // ── Services ─────────────────────────────────────────────
    /// File hierarchy service
    pub file_service: Arc<FileService>,
    /// Tree and breadcrumb service
    pub tree_service: Arc<TreeService>,
}

impl AppState {
    /// Wire services around a repository, a provider and a gate.
    pub fn new(
        config: AppConfig,
        file_repo: Arc<dyn FileRepository>,
        provider: Arc<dyn IdentityProvider>,
        gate: SessionGate,
    ) -> Self {
        let sign_ups = Arc::new(SignUpRegistry::from_config(&config.auth));
        let sign_up_settings = SignUpSettings::from_config(&config.auth);
        let file_service = Arc::new(FileService::new(Arc::clone(&file_repo)));
        let tree_service = Arc::new(TreeService::new(Arc::clone(&file_repo)));

        Self {
            config: Arc::new(config),
            file_repo,
            provider,
            gate,
            sign_ups,
            sign_up_settings,
            file_service,
            tree_service,
        }
    }

    /// Upper bound for a single provider call made by the API.
    pub fn provider_timeout(&self) -> Duration {
        self.sign_up_settings.request_timeout
    }

    /// Run a provider call under [`Self::provider_timeout`].
    pub async fn provider_call<T>(
        &self,
        call: impl Future<Output = ProviderResult<T>>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.provider_timeout(), call)
            .await
            .unwrap_or_else(|_| Err(ProviderError::timeout()))
            .map_err(Into::into)
    }
}
