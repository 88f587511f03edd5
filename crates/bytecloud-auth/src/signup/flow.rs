//! Two-step sign-up state machine.
//!
//! `CollectingCredentials` → `AwaitingVerification` → `Complete`. A failed
//! provider call leaves the flow on its current step with a banner message;
//! nothing is retried automatically.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use bytecloud_core::config::AuthConfig;
use bytecloud_core::error::AppError;
use bytecloud_core::result::AppResult;

use crate::password::PasswordValidator;
use crate::provider::{ActiveSession, IdentityProvider, ProviderError, ProviderResult};

use super::form::{SignUpForm, invalid_form};

/// Banner shown when account creation fails without a provider message.
pub const SIGN_UP_FALLBACK: &str = "An error occurred during sign-up. Please try again.";

/// Banner shown when verification fails without a provider message.
pub const VERIFICATION_FALLBACK: &str =
    "An error occurred during email verification. Please try again.";

/// Banner shown when the provider answers with a status other than complete.
pub const INCOMPLETE_VERIFICATION: &str = "Verification could not be completed. Please try again.";

/// Knobs of a sign-up flow.
#[derive(Debug, Clone)]
pub struct SignUpSettings {
    /// Strategy passed to the provider when sending the code.
    pub strategy: String,
    /// Upper bound for every provider call.
    pub request_timeout: Duration,
    /// Route returned to the client after activation.
    pub redirect_to: String,
    /// Local password policy.
    pub password: PasswordValidator,
}

impl SignUpSettings {
    /// Derive settings from the auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            strategy: config.verification_strategy.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            redirect_to: config.after_sign_up_redirect.clone(),
            password: PasswordValidator::from_config(config),
        }
    }
}

/// Where a flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SignUpStep {
    /// Waiting for valid credentials.
    CollectingCredentials,
    /// A pending sign-up exists and a code was sent.
    AwaitingVerification {
        /// Provider sign-up id.
        sign_up_id: String,
    },
    /// Verification succeeded and the session was activated.
    Complete {
        /// Activated session.
        session_id: String,
    },
}

/// Successful end of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpCompletion {
    /// The activated session.
    pub session: ActiveSession,
    /// Where the client should navigate next.
    pub redirect_to: String,
}

/// Point-in-time view of a flow.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpSnapshot {
    /// Current step.
    #[serde(flatten)]
    pub step: SignUpStep,
    /// Banner from the credentials step.
    pub auth_error: Option<String>,
    /// Banner from the verification step.
    pub verification_error: Option<String>,
    /// A provider call is in flight.
    pub busy: bool,
}

#[derive(Debug)]
struct FlowState {
    step: SignUpStep,
    auth_error: Option<String>,
    verification_error: Option<String>,
}

/// Clears the busy flag when dropped, including when the future is cancelled.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> AppResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| AppError::conflict("A sign-up request is already in progress"))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One user's way through sign-up and email verification.
#[derive(Debug)]
pub struct SignUpFlow {
    provider: Arc<dyn IdentityProvider>,
    settings: SignUpSettings,
    state: Mutex<FlowState>,
    busy: AtomicBool,
}

impl SignUpFlow {
    /// Start a flow at the credentials step.
    pub fn new(provider: Arc<dyn IdentityProvider>, settings: SignUpSettings) -> Self {
        Self {
            provider,
            settings,
            state: Mutex::new(FlowState {
                step: SignUpStep::CollectingCredentials,
                auth_error: None,
                verification_error: None,
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// Whether a provider call is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Current step.
    pub async fn step(&self) -> SignUpStep {
        self.state.lock().await.step.clone()
    }

    /// Current step and banners.
    pub async fn snapshot(&self) -> SignUpSnapshot {
        let state = self.state.lock().await;
        SignUpSnapshot {
            step: state.step.clone(),
            auth_error: state.auth_error.clone(),
            verification_error: state.verification_error.clone(),
            busy: self.is_busy(),
        }
    }

    /// Submit credentials: validate locally, create the account, send the code.
    ///
    /// Returns the provider sign-up id. Invalid forms never reach the provider.
    pub async fn submit_credentials(&self, form: &SignUpForm) -> AppResult<String> {
        form.check(&self.settings.password).map_err(invalid_form)?;

        let _busy = BusyGuard::acquire(&self.busy)?;
        {
            let mut state = self.state.lock().await;
            if state.step != SignUpStep::CollectingCredentials {
                return Err(AppError::conflict("Credentials were already submitted"));
            }
            state.auth_error = None;
        }

        let sign_up = match self
            .bounded(self.provider.create_sign_up(&form.email, &form.password))
            .await
        {
            Ok(sign_up) => sign_up,
            Err(err) => return Err(self.fail_credentials(err).await),
        };

        if let Err(err) = self
            .bounded(
                self.provider
                    .prepare_email_verification(&sign_up.id, &self.settings.strategy),
            )
            .await
        {
            return Err(self.fail_credentials(err).await);
        }

        self.state.lock().await.step = SignUpStep::AwaitingVerification {
            sign_up_id: sign_up.id.clone(),
        };
        info!(sign_up_id = %sign_up.id, "Verification code sent");
        Ok(sign_up.id)
    }

    /// Submit the emailed code; on completion, activate the session exactly once.
    pub async fn submit_code(&self, code: &str) -> AppResult<SignUpCompletion> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let sign_up_id = self.pending_sign_up_id().await?;
        self.state.lock().await.verification_error = None;

        let attempt = match self
            .bounded(self.provider.attempt_email_verification(&sign_up_id, code))
            .await
        {
            Ok(attempt) => attempt,
            Err(err) => return Err(self.fail_verification(err).await),
        };

        let Some(session_id) = attempt.completed_session() else {
            warn!(
                sign_up_id = %sign_up_id,
                status = ?attempt.status,
                "Verification did not complete"
            );
            self.state.lock().await.verification_error =
                Some(INCOMPLETE_VERIFICATION.to_string());
            return Err(AppError::validation(INCOMPLETE_VERIFICATION));
        };

        let session = match self.bounded(self.provider.set_active(session_id)).await {
            Ok(session) => session,
            Err(err) => return Err(self.fail_verification(err).await),
        };

        self.state.lock().await.step = SignUpStep::Complete {
            session_id: session.session_id.clone(),
        };
        info!(
            sign_up_id = %sign_up_id,
            session_id = %session.session_id,
            user_id = %session.user_id,
            "Sign-up completed"
        );

        Ok(SignUpCompletion {
            session,
            redirect_to: self.settings.redirect_to.clone(),
        })
    }

    /// Ask the provider to send the code again. The step does not change.
    pub async fn resend_code(&self) -> AppResult<()> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let sign_up_id = self.pending_sign_up_id().await?;

        if let Err(err) = self
            .bounded(
                self.provider
                    .prepare_email_verification(&sign_up_id, &self.settings.strategy),
            )
            .await
        {
            return Err(self.fail_verification(err).await);
        }

        info!(sign_up_id = %sign_up_id, "Verification code re-sent");
        Ok(())
    }

    async fn pending_sign_up_id(&self) -> AppResult<String> {
        match &self.state.lock().await.step {
            SignUpStep::AwaitingVerification { sign_up_id } => Ok(sign_up_id.clone()),
            SignUpStep::CollectingCredentials => {
                Err(AppError::conflict("No pending sign-up to verify"))
            }
            SignUpStep::Complete { .. } => Err(AppError::conflict("Sign-up is already complete")),
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = ProviderResult<T>>) -> ProviderResult<T> {
        tokio::time::timeout(self.settings.request_timeout, call)
            .await
            .unwrap_or_else(|_| Err(ProviderError::timeout()))
    }

    async fn fail_credentials(&self, err: ProviderError) -> AppError {
        warn!(kind = %err.kind, error = %err, "Sign-up rejected");
        let (banner, app_err) = surface(err, SIGN_UP_FALLBACK);
        self.state.lock().await.auth_error = Some(banner);
        app_err
    }

    async fn fail_verification(&self, err: ProviderError) -> AppError {
        warn!(kind = %err.kind, error = %err, "Email verification failed");
        let (banner, app_err) = surface(err, VERIFICATION_FALLBACK);
        self.state.lock().await.verification_error = Some(banner);
        app_err
    }
}

/// First provider message if there is one, else the fallback.
fn surface(err: ProviderError, fallback: &str) -> (String, AppError) {
    let banner = err.message.clone().unwrap_or_else(|| fallback.to_string());
    let mut app_err = AppError::from(err);
    app_err.message = banner.clone();
    (banner, app_err)
}
