//! Identity provider and sign-up configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external identity provider and the sign-up flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the provider's frontend API.
    pub provider_url: String,
    /// Secret key sent as a bearer token to the provider.
    #[serde(default)]
    pub secret_key: String,
    /// Upper bound for any single provider call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Strategy used when asking the provider to send a verification code.
    #[serde(default = "default_strategy")]
    pub verification_strategy: String,
    /// Minimum password length accepted before calling the provider.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Route the client is sent to once verification completes.
    #[serde(default = "default_redirect")]
    pub after_sign_up_redirect: String,
    /// How long an unfinished sign-up is kept, in minutes.
    #[serde(default = "default_pending_ttl")]
    pub pending_sign_up_ttl_minutes: u64,
    /// Delay between attempts to load provider state, in seconds.
    #[serde(default = "default_gate_retry")]
    pub gate_retry_seconds: u64,
}

fn default_request_timeout() -> u64 {
    15
}

fn default_strategy() -> String {
    "email_code".to_string()
}

fn default_password_min() -> usize {
    8
}

fn default_redirect() -> String {
    "/dashboard".to_string()
}

fn default_pending_ttl() -> u64 {
    30
}

fn default_gate_retry() -> u64 {
    5
}
