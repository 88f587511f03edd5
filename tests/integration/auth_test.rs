//! Integration tests for sign-up, verification, and sessions.

use http::StatusCode;
use serde_json::json;

use bytecloud_auth::provider::{ProviderError, ProviderErrorKind};
use bytecloud_auth::testing::ProviderCall;

use crate::helpers::{ALICE, TestApp};

fn credentials() -> serde_json::Value {
    json!({
        "email": "a@b.com",
        "password": "Secret123!",
        "confirmPassword": "Secret123!",
    })
}

#[tokio::test]
async fn test_health_reports_gate_state() {
    let app = TestApp::loading();

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], "connected");
    assert_eq!(response.data()["session_ready"], false);

    app.gate.mark_ready();
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.data()["session_ready"], true);
}

#[tokio::test]
async fn test_sign_up_and_verify() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/auth/sign-up", Some(credentials()), None)
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["signUpId"], "sua_1");
    assert_eq!(response.data()["step"], "awaiting_verification");

    let response = app
        .request(
            "POST",
            "/api/auth/sign-up/sua_1/verify",
            Some(json!({ "code": "000000" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["sessionId"], "sess_1");
    assert_eq!(response.data()["userId"], "user_1");
    assert_eq!(response.data()["redirectTo"], "/dashboard");

    assert_eq!(
        app.provider.count(|c| matches!(c, ProviderCall::SetActive { .. })),
        1
    );

    let response = app.request("GET", "/api/auth/me", None, Some("sess_1")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["userId"], "user_1");

    // Completed flows are forgotten.
    let response = app
        .request("GET", "/api/auth/sign-up/sua_1", None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_provider() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/sign-up",
            Some(json!({
                "email": "not-an-email",
                "password": "Secret123!",
                "confirmPassword": "Secret124!",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert!(response.body["details"].get("email").is_some());
    assert!(response.body["details"].get("confirmPassword").is_some());
    assert_eq!(
        app.provider
            .count(|c| matches!(c, ProviderCall::CreateSignUp { .. })),
        0
    );
}

#[tokio::test]
async fn test_existing_email_is_conflict() {
    let app = TestApp::new();
    app.provider.fail_sign_up_with(ProviderError::with_message(
        ProviderErrorKind::IdentifierExists,
        "That email address is taken. Please try another.",
    ));

    let response = app
        .request("POST", "/api/auth/sign-up", Some(credentials()), None)
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.body["message"],
        "That email address is taken. Please try another."
    );
}

#[tokio::test]
async fn test_wrong_code_keeps_flow_pending() {
    let app = TestApp::new();
    app.provider
        .verification_result(Err(ProviderError::new(ProviderErrorKind::InvalidCode)));

    let response = app
        .request("POST", "/api/auth/sign-up", Some(credentials()), None)
        .await;
    let sign_up_id = response.data()["signUpId"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            &format!("/api/auth/sign-up/{sign_up_id}/verify"),
            Some(json!({ "code": "123456" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        "An error occurred during email verification. Please try again."
    );

    let response = app
        .request("GET", &format!("/api/auth/sign-up/{sign_up_id}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["step"], "awaiting_verification");
    assert_eq!(response.data()["busy"], false);
    assert!(response.data()["verification_error"].is_string());
}

#[tokio::test]
async fn test_resend_code() {
    let app = TestApp::new();
    app.request("POST", "/api/auth/sign-up", Some(credentials()), None)
        .await;

    let response = app
        .request("POST", "/api/auth/sign-up/sua_1/resend", None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        app.provider
            .count(|c| matches!(c, ProviderCall::PrepareVerification { .. })),
        2
    );
}

#[tokio::test]
async fn test_unknown_sign_up_is_not_found() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/sign-up/sua_missing/verify",
            Some(json!({ "code": "000000" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sign_out_ends_session() {
    let app = TestApp::new();

    let response = app.request("POST", "/api/auth/sign-out", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_or_unknown_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/files", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/api/files", None, Some("tok_nobody")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gated_routes_wait_for_session_layer() {
    let app = TestApp::loading();

    let response = app.request("GET", "/api/files", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "SESSION_LOADING");
    assert_eq!(
        app.provider
            .count(|c| matches!(c, ProviderCall::ResolveSession { .. })),
        0
    );

    // Sign-up stays available while loading.
    let response = app
        .request("POST", "/api/auth/sign-up", Some(credentials()), None)
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    app.gate.mark_ready();
    let response = app.request("GET", "/api/files", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::OK);
}
