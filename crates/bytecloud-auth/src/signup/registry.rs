//! Pending sign-up flows between the credentials and verification requests.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use bytecloud_core::config::AuthConfig;
use bytecloud_core::error::AppError;
use bytecloud_core::result::AppResult;

use super::flow::SignUpFlow;

#[derive(Debug)]
struct PendingSignUp {
    flow: Arc<SignUpFlow>,
    created_at: Instant,
}

/// Flows keyed by provider sign-up id, dropped after a fixed TTL.
#[derive(Debug)]
pub struct SignUpRegistry {
    flows: DashMap<String, PendingSignUp>,
    ttl: Duration,
}

impl SignUpRegistry {
    /// Create a registry whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            flows: DashMap::new(),
            ttl,
        }
    }

    /// Create a registry from the auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(Duration::from_secs(config.pending_sign_up_ttl_minutes * 60))
    }

    /// Track a flow that reached the verification step.
    pub fn insert(&self, sign_up_id: impl Into<String>, flow: Arc<SignUpFlow>) {
        self.flows.insert(
            sign_up_id.into(),
            PendingSignUp {
                flow,
                created_at: Instant::now(),
            },
        );
    }

    /// Look up a live flow.
    pub fn get(&self, sign_up_id: &str) -> AppResult<Arc<SignUpFlow>> {
        let expired = match self.flows.get(sign_up_id) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                return Ok(entry.flow.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.flows.remove(sign_up_id);
            debug!(sign_up_id, "Dropped expired sign-up on access");
        }
        Err(AppError::not_found("Sign-up not found or expired"))
    }

    /// Forget a flow.
    pub fn remove(&self, sign_up_id: &str) -> bool {
        self.flows.remove(sign_up_id).is_some()
    }

    /// Number of tracked flows, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Whether no flow is tracked.
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Drop every expired flow. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.flows.len();
        self.flows
            .retain(|_, pending| pending.created_at.elapsed() < self.ttl);
        before.saturating_sub(self.flows.len())
    }

    /// Run [`sweep`](Self::sweep) every `every` until the task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    info!(removed, remaining = self.len(), "Swept expired sign-ups");
                }
            }
        })
    }
}
