//! Integration test support for Libris.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p libris-integration-tests
//! ```
//!
//! Everything runs in-process: the axum router is driven with
//! `tower::ServiceExt::oneshot` over an in-memory document store, local
//! accounts, inline uploads and an in-memory session store. No database or
//! network access is needed.
//!
//! # Test Categories
//!
//! - `lifecycle` - Prober, initializer and settings store against the store
//! - `phase_router` - Signal handling and re-probing in the phase router
//! - `http_api` - The JSON API from an empty store to `ready`

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use libris_admin::middleware::session_layer;
use libris_admin::services::auth::LocalAuthProvider;
use libris_admin::services::media::InlineUploader;
use libris_admin::state::AppState;
use libris_admin::store::MemoryDocumentStore;

/// Root administrator used by the HTTP tests.
pub const ROOT_EMAIL: &str = "root@library.org";
pub const ROOT_PASSWORD: &str = "correct horse battery";

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "libris-test-boundary";

/// An in-process server plus a single-client cookie jar.
pub struct TestApp {
    pub store: Arc<MemoryDocumentStore>,
    pub auth: Arc<LocalAuthProvider>,
    router: Router,
    cookie: Option<String>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// A fresh app over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let auth = Arc::new(LocalAuthProvider::new());
        let state = AppState::new(
            store.clone(),
            auth.clone(),
            Arc::new(InlineUploader),
            "libris-tests".to_owned(),
        );
        let router = libris_admin::app(state, session_layer(MemoryStore::default(), false));

        Self {
            store,
            auth,
            router,
            cookie: None,
        }
    }

    /// Forget the session cookie.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Send a request with the current cookie; keeps any new session cookie.
    pub async fn send(&mut self, mut request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
        if let Some(cookie) = &self.cookie {
            request.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("Failed to build cookie header"),
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let value = set_cookie.to_str().expect("Cookie is ASCII");
            let pair = value.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes()
            .to_vec();

        (status, bytes, content_type)
    }

    /// Send a JSON request (or an empty one) and parse the JSON response.
    ///
    /// Non-JSON and empty bodies come back as `Value::Null`.
    pub async fn json(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let (status, bytes, _) = self.send(request).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::PUT, uri, Some(body)).await
    }

    /// Current phase name from `/api/system/phase`.
    pub async fn phase(&mut self) -> String {
        let (_, body) = self.get("/api/system/phase").await;
        body["phase"].as_str().unwrap_or_default().to_owned()
    }

    /// Run first-time setup as the root administrator.
    pub async fn initialize(&mut self) -> (StatusCode, Value) {
        self.post(
            "/api/setup/initialize",
            serde_json::json!({
                "name": "Root Admin",
                "email": ROOT_EMAIL,
                "password": ROOT_PASSWORD,
            }),
        )
        .await
    }

    /// Sign in with email and password.
    pub async fn login(&mut self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }
}

/// A `multipart/form-data` body with one file field.
#[must_use]
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
