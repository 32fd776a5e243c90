//! Common test utilities and helpers.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wired::AppState;

pub const BOOTSTRAP_TOKEN: &str = "test-bootstrap";

/// Router plus the state behind it.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    /// App over a fresh in-memory database.
    pub async fn new() -> Self {
        Self::with_path(":memory:").await
    }

    /// App over a database at `path`.
    pub async fn with_path(path: &str) -> Self {
        let db = wired::db::connect(path).await.expect("Failed to open database");
        let state = AppState::from_pool(db, Some(BOOTSTRAP_TOKEN.to_string()));
        Self {
            app: wired::app(state.clone()),
            state,
        }
    }

    /// Send a request and return status plus JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, extract_json(response).await)
    }

    /// Register a user and return `(user_id, token)`.
    pub async fn register(&self, name: &str, role: &str, stack: &[&str]) -> (String, String) {
        let mut body = json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "role": role,
            "technologicalStack": stack,
        });
        if role == "admin" {
            body["bootstrapToken"] = json!(BOOTSTRAP_TOKEN);
        }

        let (status, body) = self.send(public_post_json("/api/auth/register", body)).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Create a project as `token` and return its id.
    pub async fn create_project(&self, token: &str, name: &str, technologies: &[&str]) -> String {
        let (status, body) = self
            .send(post_json(
                "/api/project",
                token,
                json!({
                    "name": name,
                    "description": format!("{} description", name),
                    "technologies": technologies,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Open a join request and return the raw response.
    pub async fn open_request(
        &self,
        token: &str,
        receiver_id: &str,
        project_id: &str,
        kind: &str,
    ) -> (StatusCode, Value) {
        self.send(post_json(
            "/api/request",
            token,
            json!({
                "receiverId": receiver_id,
                "projectId": project_id,
                "type": kind,
            }),
        ))
        .await
    }

    /// Move a request to `status` and return the raw response.
    pub async fn set_status(&self, token: &str, request_id: &str, status: &str) -> (StatusCode, Value) {
        self.send(put_json(
            &format!("/api/request/{}/status", request_id),
            token,
            json!({ "status": status }),
        ))
        .await
    }
}

/// Extract JSON body from response
pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Stable error code from an error body.
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}

/// Create a GET request
pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Create an unauthenticated POST request with JSON body
pub fn public_post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Create a POST request with JSON body
pub fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Create a PUT request with JSON body
pub fn put_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}
