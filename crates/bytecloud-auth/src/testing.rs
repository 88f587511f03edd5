//! Recording identity provider for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::provider::{
    ActiveSession, IdentityProvider, ProviderError, ProviderErrorKind, ProviderResult,
    SignUpAttempt, VerificationAttempt, VerificationStatus,
};

/// A call received by [`MockIdentityProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Load,
    CreateSignUp { email: String },
    PrepareVerification { sign_up_id: String, strategy: String },
    AttemptVerification { sign_up_id: String, code: String },
    SetActive { session_id: String },
    ResolveSession { token: String },
    EndSession { session_id: String },
}

#[derive(Debug)]
struct Script {
    calls: Vec<ProviderCall>,
    load_failures: u32,
    sign_up_error: Option<ProviderError>,
    prepare_error: Option<ProviderError>,
    verification: ProviderResult<VerificationAttempt>,
    user_id: String,
    hang: bool,
    next_sign_up: u32,
    sessions: HashMap<String, ActiveSession>,
}

/// In-process [`IdentityProvider`] that records every call.
///
/// By default every call succeeds, verification completes with session
/// `sess_1`, and activated sessions belong to `user_1`.
#[derive(Debug)]
pub struct MockIdentityProvider {
    script: Mutex<Script>,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                calls: Vec::new(),
                load_failures: 0,
                sign_up_error: None,
                prepare_error: None,
                verification: Ok(VerificationAttempt {
                    status: VerificationStatus::Complete,
                    created_session_id: Some("sess_1".to_string()),
                }),
                user_id: "user_1".to_string(),
                hang: false,
                next_sign_up: 0,
                sessions: HashMap::new(),
            }),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `n` calls to `load`.
    pub fn fail_loads(&self, n: u32) {
        self.script().load_failures = n;
    }

    /// Make `create_sign_up` fail.
    pub fn fail_sign_up_with(&self, err: ProviderError) {
        self.script().sign_up_error = Some(err);
    }

    /// Make `prepare_email_verification` fail.
    pub fn fail_prepare_with(&self, err: ProviderError) {
        self.script().prepare_error = Some(err);
    }

    /// Result of `attempt_email_verification`.
    pub fn verification_result(&self, result: ProviderResult<VerificationAttempt>) {
        self.script().verification = result;
    }

    /// Owner of sessions activated through `set_active`.
    pub fn activate_as(&self, user_id: impl Into<String>) {
        self.script().user_id = user_id.into();
    }

    /// Make sign-up calls never answer.
    pub fn hang(&self, hang: bool) {
        self.script().hang = hang;
    }

    /// Register a bearer token that resolves to a session of `user_id`.
    pub fn with_session(&self, token: impl Into<String>, user_id: impl Into<String>) {
        let token = token.into();
        self.script().sessions.insert(
            token.clone(),
            ActiveSession {
                session_id: token,
                user_id: user_id.into(),
            },
        );
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.script().calls.clone()
    }

    /// Number of received calls matching `filter`.
    pub fn count(&self, filter: impl Fn(&ProviderCall) -> bool) -> usize {
        self.script().calls.iter().filter(|c| filter(c)).count()
    }

    fn record(&self, call: ProviderCall) -> bool {
        let mut script = self.script();
        script.calls.push(call);
        script.hang
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn load(&self) -> ProviderResult<()> {
        self.record(ProviderCall::Load);
        let mut script = self.script();
        if script.load_failures > 0 {
            script.load_failures -= 1;
            return Err(ProviderError::new(ProviderErrorKind::Network));
        }
        Ok(())
    }

    async fn create_sign_up(&self, email: &str, _password: &str) -> ProviderResult<SignUpAttempt> {
        if self.record(ProviderCall::CreateSignUp {
            email: email.to_string(),
        }) {
            std::future::pending::<()>().await;
        }

        let mut script = self.script();
        if let Some(err) = script.sign_up_error.clone() {
            return Err(err);
        }
        script.next_sign_up += 1;
        Ok(SignUpAttempt {
            id: format!("sua_{}", script.next_sign_up),
            status: VerificationStatus::MissingRequirements,
        })
    }

    async fn prepare_email_verification(
        &self,
        sign_up_id: &str,
        strategy: &str,
    ) -> ProviderResult<()> {
        self.record(ProviderCall::PrepareVerification {
            sign_up_id: sign_up_id.to_string(),
            strategy: strategy.to_string(),
        });
        match self.script().prepare_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn attempt_email_verification(
        &self,
        sign_up_id: &str,
        code: &str,
    ) -> ProviderResult<VerificationAttempt> {
        if self.record(ProviderCall::AttemptVerification {
            sign_up_id: sign_up_id.to_string(),
            code: code.to_string(),
        }) {
            std::future::pending::<()>().await;
        }
        self.script().verification.clone()
    }

    async fn set_active(&self, session_id: &str) -> ProviderResult<ActiveSession> {
        self.record(ProviderCall::SetActive {
            session_id: session_id.to_string(),
        });
        let mut script = self.script();
        let session = ActiveSession {
            session_id: session_id.to_string(),
            user_id: script.user_id.clone(),
        };
        script
            .sessions
            .insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    async fn resolve_session(&self, token: &str) -> ProviderResult<ActiveSession> {
        self.record(ProviderCall::ResolveSession {
            token: token.to_string(),
        });
        self.script()
            .sessions
            .get(token)
            .cloned()
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::InvalidSession))
    }

    async fn end_session(&self, session_id: &str) -> ProviderResult<()> {
        self.record(ProviderCall::EndSession {
            session_id: session_id.to_string(),
        });
        match self.script().sessions.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(ProviderError::new(ProviderErrorKind::InvalidSession)),
        }
    }
}
