// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use storycraft::config::Config;
use storycraft::db::Database;
use storycraft::routes::create_router;
use storycraft::services::UploadStore;
use storycraft::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----storycraft-test-boundary";

/// Check if a MongoDB test server is available via environment variable.
#[allow(dead_code)]
pub fn mongo_available() -> bool {
    std::env::var("MONGO_TEST_URI").is_ok()
}

/// Skip test with message if MongoDB is not available.
#[macro_export]
macro_rules! require_mongo {
    () => {
        if !crate::common::mongo_available() {
            eprintln!("⚠️  Skipping: MONGO_TEST_URI not set");
            return;
        }
    };
}

/// Test app backed by the in-memory store and a scratch public directory.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub public_dir: TempDir,
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::default())
}

/// Like [`create_test_app`], with `public_dir` replaced by a scratch directory.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> TestApp {
    let public_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = Config {
        public_dir: public_dir.path().to_path_buf(),
        ..config
    };
    let uploads = UploadStore::new(config.public_dir.clone(), config.max_upload_bytes);

    let state = Arc::new(AppState {
        config,
        db: Database::new_in_memory(),
        uploads,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        public_dir,
    }
}

impl TestApp {
    /// Send a request and return status plus parsed JSON body (`Null` if not JSON).
    #[allow(dead_code)]
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Sign up with a JSON body.
    #[allow(dead_code)]
    pub async fn signup(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({
            "name": "Test Writer",
            "username": username,
            "password": password,
            "role": "Writer",
        });
        self.send(json_request("POST", "/api/auth/signup", None, &body))
            .await
    }

    /// Log in and return the response body.
    #[allow(dead_code)]
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({ "username": username, "password": password });
        self.send(json_request("POST", "/api/auth/login", None, &body))
            .await
    }

    /// Sign up and log in, returning `(token, user_id)`.
    #[allow(dead_code)]
    pub async fn register(&self, username: &str) -> (String, String) {
        let (status, _) = self.signup(username, "pw123456").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(username, "pw123456").await;
        assert_eq!(status, StatusCode::OK);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["_id"].as_str().unwrap().to_string(),
        )
    }

    /// Create a story owned by the token's user and return its id.
    #[allow(dead_code)]
    pub async fn create_story(&self, token: &str, title: &str) -> String {
        let body = serde_json::json!({ "title": title, "genre": "Fantasy" });
        let (status, story) = self
            .send(json_request("POST", "/api/stories/create", Some(token), &body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        story["_id"].as_str().unwrap().to_string()
    }

    /// Filesystem path of a stored `/uploads/...` URL.
    #[allow(dead_code)]
    pub fn upload_path(&self, public_path: &str) -> std::path::PathBuf {
        self.state
            .uploads
            .resolve(public_path)
            .expect("Not an uploads path")
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// One part of a multipart body.
#[allow(dead_code)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

#[allow(dead_code)]
pub fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                        name, value
                    )
                    .as_bytes(),
                );
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}
