//! Identity provider client over the provider's HTTP frontend API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use bytecloud_core::config::AuthConfig;
use bytecloud_core::error::{AppError, ErrorKind};

use super::{
    ActiveSession, IdentityProvider, ProviderError, ProviderErrorKind, ProviderResult,
    SignUpAttempt, VerificationAttempt, VerificationStatus,
};

/// Every successful provider payload is wrapped in `{"response": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SignUpObject {
    id: String,
    status: VerificationStatus,
    #[serde(default)]
    created_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    user_id: String,
    #[serde(default)]
    status: Option<String>,
}

impl SessionObject {
    fn into_active(self) -> ProviderResult<ActiveSession> {
        match self.status.as_deref() {
            None | Some("active") => Ok(ActiveSession {
                session_id: self.id,
                user_id: self.user_id,
            }),
            Some(other) => Err(ProviderError::with_message(
                ProviderErrorKind::InvalidSession,
                format!("Session is {other}"),
            )),
        }
    }
}

/// [`IdentityProvider`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpIdentityProvider {
    /// Build a client from the auth configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build identity provider client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.provider_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ProviderResult<T> {
        let response = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Identity provider request failed"))?;

        let status = response.status();
        if status.is_success() {
            let envelope: Envelope<T> = response.json().await?;
            return Ok(envelope.response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ProviderError::from_body(status.as_u16(), &body);
        debug!(status = status.as_u16(), kind = %err.kind, "Identity provider rejected request");
        Err(err)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn load(&self) -> ProviderResult<()> {
        self.send::<serde_json::Value>(self.client.get(self.url("/v1/environment")))
            .await
            .map(|_| ())
    }

    async fn create_sign_up(&self, email: &str, password: &str) -> ProviderResult<SignUpAttempt> {
        let body = json!({ "email_address": email, "password": password });
        let sign_up: SignUpObject = self
            .send(self.client.post(self.url("/v1/client/sign_ups")).json(&body))
            .await?;
        Ok(SignUpAttempt {
            id: sign_up.id,
            status: sign_up.status,
        })
    }

    async fn prepare_email_verification(
        &self,
        sign_up_id: &str,
        strategy: &str,
    ) -> ProviderResult<()> {
        let url = self.url(&format!("/v1/client/sign_ups/{sign_up_id}/prepare_verification"));
        let body = json!({ "strategy": strategy });
        self.send::<serde_json::Value>(self.client.post(url).json(&body))
            .await
            .map(|_| ())
    }

    async fn attempt_email_verification(
        &self,
        sign_up_id: &str,
        code: &str,
    ) -> ProviderResult<VerificationAttempt> {
        let url = self.url(&format!("/v1/client/sign_ups/{sign_up_id}/attempt_verification"));
        let body = json!({ "strategy": "email_code", "code": code });
        let sign_up: SignUpObject = self.send(self.client.post(url).json(&body)).await?;
        Ok(VerificationAttempt {
            status: sign_up.status,
            created_session_id: sign_up.created_session_id,
        })
    }

    async fn set_active(&self, session_id: &str) -> ProviderResult<ActiveSession> {
        let url = self.url(&format!("/v1/client/sessions/{session_id}/touch"));
        let session: SessionObject = self.send(self.client.post(url)).await?;
        session.into_active()
    }

    async fn resolve_session(&self, token: &str) -> ProviderResult<ActiveSession> {
        let url = self.url(&format!("/v1/client/sessions/{token}"));
        let session: SessionObject = self.send(self.client.get(url)).await?;
        session.into_active()
    }

    async fn end_session(&self, session_id: &str) -> ProviderResult<()> {
        let url = self.url(&format!("/v1/client/sessions/{session_id}/end"));
        self.send::<serde_json::Value>(self.client.post(url))
            .await
            .map(|_| ())
    }
}
