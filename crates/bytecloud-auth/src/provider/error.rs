//! Typed failures returned by the identity provider.

use std::fmt;

use serde::Deserialize;

use bytecloud_core::error::{AppError, ErrorKind};

/// Closed set of failure categories the provider can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// The email address is already registered.
    IdentifierExists,
    /// The password was rejected by the provider's policy.
    WeakPassword,
    /// The verification code does not match.
    InvalidCode,
    /// The verification code is no longer valid.
    ExpiredCode,
    /// The pending sign-up does not exist (expired or never created).
    NoPendingSignUp,
    /// The session token is unknown, ended, or expired.
    InvalidSession,
    /// The provider throttled the request.
    RateLimited,
    /// No answer within the configured bound.
    Timeout,
    /// The provider could not be reached.
    Network,
    /// Anything else, including malformed responses.
    Unexpected,
}

impl ProviderErrorKind {
    /// Map a provider error code onto a kind.
    pub fn from_code(code: &str) -> Self {
        match code {
            "form_identifier_exists" => Self::IdentifierExists,
            c if c.starts_with("form_password_") => Self::WeakPassword,
            "form_code_incorrect" => Self::InvalidCode,
            "verification_expired" | "verification_failed" => Self::ExpiredCode,
            "sign_up_not_found" | "resource_not_found" => Self::NoPendingSignUp,
            "session_not_found" | "session_expired" | "authentication_invalid" => {
                Self::InvalidSession
            }
            "too_many_requests" => Self::RateLimited,
            _ => Self::Unexpected,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IdentifierExists => "identifier exists",
            Self::WeakPassword => "weak password",
            Self::InvalidCode => "invalid code",
            Self::ExpiredCode => "expired code",
            Self::NoPendingSignUp => "no pending sign-up",
            Self::InvalidSession => "invalid session",
            Self::RateLimited => "rate limited",
            Self::Timeout => "timeout",
            Self::Network => "network error",
            Self::Unexpected => "unexpected provider error",
        };
        write!(f, "{s}")
    }
}

/// A provider failure: a required kind and the provider's first message, if any.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ProviderError {
    /// Failure category.
    pub kind: ProviderErrorKind,
    /// First human-readable message from the provider.
    pub message: Option<String>,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl ProviderError {
    /// Create an error without a message.
    pub fn new(kind: ProviderErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Create an error carrying a message.
    pub fn with_message(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// The bounded wait on a provider call expired.
    pub fn timeout() -> Self {
        Self::new(ProviderErrorKind::Timeout)
    }

    /// Decode a provider error body.
    ///
    /// Only the first entry of `errors` is used. An HTTP 429 is always
    /// reported as [`ProviderErrorKind::RateLimited`].
    pub fn from_body(status: u16, body: &str) -> Self {
        let first = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.errors.into_iter().next());

        let kind = if status == 429 {
            ProviderErrorKind::RateLimited
        } else {
            first
                .as_ref()
                .map(|e| ProviderErrorKind::from_code(&e.code))
                .unwrap_or(ProviderErrorKind::Unexpected)
        };

        Self {
            kind,
            message: first.and_then(ErrorEntry::into_message),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if err.is_decode() {
            ProviderErrorKind::Unexpected
        } else {
            ProviderErrorKind::Network
        };
        Self::new(kind)
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let kind = match err.kind {
            ProviderErrorKind::IdentifierExists => ErrorKind::Conflict,
            ProviderErrorKind::WeakPassword
            | ProviderErrorKind::InvalidCode
            | ProviderErrorKind::ExpiredCode => ErrorKind::Validation,
            ProviderErrorKind::NoPendingSignUp => ErrorKind::NotFound,
            ProviderErrorKind::InvalidSession => ErrorKind::Authentication,
            ProviderErrorKind::RateLimited => ErrorKind::RateLimit,
            ProviderErrorKind::Timeout => ErrorKind::Timeout,
            ProviderErrorKind::Network | ProviderErrorKind::Unexpected => {
                ErrorKind::ExternalService
            }
        };
        let message = err
            .message
            .clone()
            .unwrap_or_else(|| format!("Identity provider: {}", err.kind));
        AppError::with_source(kind, message, err)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    code: String,
    message: Option<String>,
    long_message: Option<String>,
}

impl ErrorEntry {
    fn into_message(self) -> Option<String> {
        self.long_message
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}
