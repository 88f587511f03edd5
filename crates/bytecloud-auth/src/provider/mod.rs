//! External identity provider contract.
//!
//! The provider owns accounts, pending sign-ups and sessions. This crate only
//! consumes its API through [`IdentityProvider`], so the HTTP client and the
//! test double are interchangeable.

pub mod error;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{ProviderError, ProviderErrorKind};
pub use http::HttpIdentityProvider;

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Status of a sign-up or of a verification attempt, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// All requirements met; a session was created.
    Complete,
    /// The sign-up still needs input (for instance a verified email).
    MissingRequirements,
    /// The sign-up was abandoned.
    Abandoned,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A pending sign-up created on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpAttempt {
    /// Provider-issued sign-up identifier.
    pub id: String,
    /// Current status.
    pub status: VerificationStatus,
}

/// Outcome of an email verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    /// Status after the attempt.
    pub status: VerificationStatus,
    /// Session created on completion.
    pub created_session_id: Option<String>,
}

impl VerificationAttempt {
    /// The session id, only when the attempt completed the sign-up.
    pub fn completed_session(&self) -> Option<&str> {
        match self.status {
            VerificationStatus::Complete => self.created_session_id.as_deref(),
            _ => None,
        }
    }
}

/// An active session on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    /// Session identifier.
    pub session_id: String,
    /// Account the session belongs to.
    pub user_id: String,
}

/// Operations consumed from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Fetch provider state needed before any session can be served.
    async fn load(&self) -> ProviderResult<()>;

    /// Create a pending account.
    async fn create_sign_up(&self, email: &str, password: &str) -> ProviderResult<SignUpAttempt>;

    /// Ask the provider to send a one-time code for the pending sign-up.
    async fn prepare_email_verification(
        &self,
        sign_up_id: &str,
        strategy: &str,
    ) -> ProviderResult<()>;

    /// Submit the one-time code.
    async fn attempt_email_verification(
        &self,
        sign_up_id: &str,
        code: &str,
    ) -> ProviderResult<VerificationAttempt>;

    /// Activate a session created by a completed sign-up.
    async fn set_active(&self, session_id: &str) -> ProviderResult<ActiveSession>;

    /// Resolve a bearer token to its session.
    async fn resolve_session(&self, token: &str) -> ProviderResult<ActiveSession>;

    /// End a session.
    async fn end_session(&self, session_id: &str) -> ProviderResult<()>;
}
