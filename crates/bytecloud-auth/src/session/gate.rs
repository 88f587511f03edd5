//! Gate that holds dependent work until the provider has loaded.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::provider::IdentityProvider;

/// Readiness of the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Provider state not loaded yet.
    Loading,
    /// Sessions can be resolved.
    Ready,
}

/// Shared readiness flag backed by a `watch` channel.
///
/// The gate has no failure state: load errors are logged and retried.
#[derive(Debug, Clone)]
pub struct SessionGate {
    state: Arc<watch::Sender<GateState>>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    /// A gate in the loading state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateState::Loading);
        Self {
            state: Arc::new(tx),
        }
    }

    /// A gate that is already open.
    pub fn ready() -> Self {
        let gate = Self::new();
        gate.mark_ready();
        gate
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Whether the gate is open.
    pub fn is_ready(&self) -> bool {
        self.state() == GateState::Ready
    }

    /// Open the gate.
    pub fn mark_ready(&self) {
        self.state.send_replace(GateState::Ready);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Suspend until the gate opens.
    pub async fn wait_ready(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|s| *s == GateState::Ready).await;
    }

    /// Produce the gated value once ready; `None` while loading.
    pub fn render<T>(&self, subtree: impl FnOnce() -> T) -> Option<T> {
        self.is_ready().then(subtree)
    }

    /// Load provider state in the background, retrying every `retry` until it succeeds.
    pub fn spawn_load(
        &self,
        provider: Arc<dyn IdentityProvider>,
        retry: Duration,
    ) -> JoinHandle<()> {
        let gate = self.clone();
        tokio::spawn(async move {
            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                match provider.load().await {
                    Ok(()) => {
                        gate.mark_ready();
                        info!(attempt, "Identity provider loaded, session gate open");
                        return;
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Identity provider not ready, retrying");
                        tokio::time::sleep(retry).await;
                    }
                }
            }
        })
    }
}
