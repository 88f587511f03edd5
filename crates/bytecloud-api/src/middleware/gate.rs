//! Holds gated routes behind the session gate.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// Answers `503 SESSION_LOADING` until the identity provider has loaded.
pub async fn require_session_ready(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.gate.is_ready() {
        let body = ApiErrorResponse {
            success: false,
            error: "SESSION_LOADING".to_string(),
            message: "Session is still loading, retry shortly".to_string(),
            details: None,
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }

    next.run(request).await
}
