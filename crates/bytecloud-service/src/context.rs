//! Request context carrying the authenticated session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bytecloud_auth::ActiveSession;

/// Context for the current authenticated request.
///
/// Built from the resolved provider session and passed into every service
/// method, so each operation knows *who* is acting and from *which* session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Account id issued by the identity provider.
    pub user_id: String,
    /// Provider session id.
    pub session_id: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            request_time: Utc::now(),
        }
    }

    /// Whether `owner` is the acting user.
    pub fn owns(&self, owner: &str) -> bool {
        self.user_id == owner
    }
}

impl From<ActiveSession> for RequestContext {
    fn from(session: ActiveSession) -> Self {
        Self::new(session.user_id, session.session_id)
    }
}
