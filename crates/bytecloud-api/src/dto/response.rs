//! Response DTOs.

use serde::{Deserialize, Serialize};

use bytecloud_auth::signup::SignUpCompletion;
use bytecloud_service::RequestContext;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// `connected` or `unavailable`.
    pub database: String,
    /// Whether the session layer has loaded.
    pub session_ready: bool,
}

/// Credentials accepted; a code is on its way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpStartedResponse {
    /// Pending sign-up id, used in the verify/resend routes.
    pub sign_up_id: String,
    /// Always `awaiting_verification`.
    pub step: String,
}

impl SignUpStartedResponse {
    pub fn new(sign_up_id: String) -> Self {
        Self {
            sign_up_id,
            step: "awaiting_verification".to_string(),
        }
    }
}

/// Verification succeeded and the session is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpCompletedResponse {
    /// Activated session; also the bearer token for later calls.
    pub session_id: String,
    /// New account.
    pub user_id: String,
    /// Where the client navigates next.
    pub redirect_to: String,
}

impl From<SignUpCompletion> for SignUpCompletedResponse {
    fn from(done: SignUpCompletion) -> Self {
        Self {
            session_id: done.session.session_id,
            user_id: done.session.user_id,
            redirect_to: done.redirect_to,
        }
    }
}

/// The caller's session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Account id.
    pub user_id: String,
    /// Session id.
    pub session_id: String,
}

impl From<&RequestContext> for SessionResponse {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            user_id: ctx.user_id.clone(),
            session_id: ctx.session_id.clone(),
        }
    }
}
