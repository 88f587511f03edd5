//! Sign-up, verification and session handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use bytecloud_auth::signup::{SignUpFlow, SignUpForm, SignUpSnapshot};

use crate::dto::request::{VerifyCodeRequest, validate_body};
use crate::dto::response::{
    ApiResponse, MessageResponse, SessionResponse, SignUpCompletedResponse, SignUpStartedResponse,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Json(form): Json<SignUpForm>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SignUpStartedResponse>>)> {
    let flow = Arc::new(SignUpFlow::new(
        Arc::clone(&state.provider),
        state.sign_up_settings.clone(),
    ));
    let sign_up_id = flow.submit_credentials(&form).await?;
    state.sign_ups.insert(sign_up_id.clone(), flow);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SignUpStartedResponse::new(sign_up_id))),
    ))
}

/// GET /api/auth/sign-up/{id}
pub async fn sign_up_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SignUpSnapshot>>> {
    let flow = state.sign_ups.get(&id)?;
    Ok(Json(ApiResponse::ok(flow.snapshot().await)))
}

/// POST /api/auth/sign-up/{id}/verify
pub async fn verify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VerifyCodeRequest>,
) -> ApiResult<Json<ApiResponse<SignUpCompletedResponse>>> {
    validate_body(&req)?;

    let flow = state.sign_ups.get(&id)?;
    let done = flow.submit_code(req.code.trim()).await?;
    state.sign_ups.remove(&id);

    Ok(Json(ApiResponse::ok(done.into())))
}

/// POST /api/auth/sign-up/{id}/resend
pub async fn resend(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let flow = state.sign_ups.get(&id)?;
    flow.resend_code().await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Verification code sent",
    ))))
}

/// POST /api/auth/sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state
        .provider_call(state.provider.end_session(&auth.session_id))
        .await?;
    info!(user_id = %auth.user_id, session_id = %auth.session_id, "Signed out");

    Ok(Json(ApiResponse::ok(MessageResponse::new("Signed out"))))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(SessionResponse::from(auth.context())))
}
