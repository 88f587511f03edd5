//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use bytecloud_api::{AppState, build_app};
use bytecloud_auth::SessionGate;
use bytecloud_auth::testing::MockIdentityProvider;
use bytecloud_core::config::AppConfig;
use bytecloud_database::MemoryFileRepository;

const TEST_CONFIG: &str = r#"
[database]
url = "postgres://unused"

[storage]
backend = "memory"

[auth]
provider_url = "http://provider.test"
"#;

/// Bearer token of the first seeded user.
pub const ALICE: &str = "tok_alice";
/// Bearer token of the second seeded user.
pub const BOB: &str = "tok_bob";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Scripted identity provider
    pub provider: Arc<MockIdentityProvider>,
    /// Session gate shared with the router
    pub gate: SessionGate,
}

impl TestApp {
    /// A ready application with two signed-in users.
    pub fn new() -> Self {
        Self::with_gate(SessionGate::ready())
    }

    /// An application whose session layer is still loading.
    pub fn loading() -> Self {
        Self::with_gate(SessionGate::new())
    }

    fn with_gate(gate: SessionGate) -> Self {
        let config = AppConfig::from_toml(TEST_CONFIG).expect("Failed to parse test config");

        let provider = Arc::new(MockIdentityProvider::new());
        provider.with_session(ALICE, "alice");
        provider.with_session(BOB, "bob");

        let state = AppState::new(
            config,
            Arc::new(MemoryFileRepository::new()),
            provider.clone(),
            gate.clone(),
        );

        Self {
            router: build_app(state),
            provider,
            gate,
        }
    }

    /// Send a request through the router
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Create a folder as `token` and return its id.
    pub async fn folder(&self, token: &str, name: &str, parent_id: Option<&str>) -> String {
        let response = self
            .request(
                "POST",
                "/api/folders",
                Some(serde_json::json!({ "name": name, "parentId": parent_id })),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.id()
    }

    /// Register an uploaded file as `token` and return its id.
    pub async fn file(&self, token: &str, name: &str, parent_id: Option<&str>) -> String {
        let response = self
            .request(
                "POST",
                "/api/files",
                Some(serde_json::json!({
                    "name": name,
                    "size": 2048,
                    "type": "text/plain",
                    "fileUrl": format!("https://cdn.test/{name}"),
                    "parentId": parent_id,
                })),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.id()
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success body.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// `data.id` as a string.
    pub fn id(&self) -> String {
        self.data()["id"]
            .as_str()
            .expect("Response has no data.id")
            .to_string()
    }

    /// Names of the records in `data.items` (or in `data` when it is an array).
    pub fn names(&self) -> Vec<String> {
        let data = self.data();
        let items = data.get("items").unwrap_or(data);
        items
            .as_array()
            .expect("Response data is not a list")
            .iter()
            .filter_map(|r| r["name"].as_str().map(String::from))
            .collect()
    }
}
