//! Integration tests for the JSON API.
//!
//! Each test builds a fresh in-process app (see `TestApp`) and drives it
//! with one cookie-carrying client.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::json;

use libris_admin::services::AuthProvider;
use libris_admin::store::DocumentStore;
use libris_core::{Email, OrganizationSettings, SettingsDocument};
use libris_integration_tests::{BOUNDARY, ROOT_EMAIL, ROOT_PASSWORD, TestApp, multipart_body};

fn configured_organization() -> serde_json::Value {
    json!({
        "Name": "Central Library",
        "Contact": {
            "Email": "desk@central.org",
            "Phone": "555-0100",
            "WhatsApp": "",
            "Facebook": "",
            "Instagram": ""
        }
    })
}

fn logo_request(content_type: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/settings/organization/logo")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("file", "logo", content_type, bytes)))
        .unwrap()
}

// ============================================================================
// Health & Phase
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::new();

    let (status, _) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);

    app.store.set_unavailable(true);
    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_flow_from_empty_store_to_ready() {
    let mut app = TestApp::new();
    assert_eq!(app.phase().await, "needs_initialization");

    let (status, body) = app.initialize().await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"], "needs_configuration");
    assert_eq!(body["admin"]["role"], "super_admin");
    assert_eq!(app.phase().await, "needs_configuration");

    let (status, body) = app
        .put("/api/settings/organization", configured_organization())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Name"], "Central Library");

    assert_eq!(app.phase().await, "ready");

    app.clear_cookies();
    assert_eq!(app.phase().await, "needs_authentication");
}

#[tokio::test]
async fn test_probe_failure_is_reported_as_phase() {
    let mut app = TestApp::new();
    app.store.set_unavailable(true);

    let (status, body) = app.get("/api/system/phase").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "error");
    assert!(body["message"].is_string());
}

// ============================================================================
// Setup
// ============================================================================

#[tokio::test]
async fn test_second_initialize_conflicts() {
    let mut app = TestApp::new();
    app.initialize().await;

    let (status, body) = app.initialize().await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_initialize_validates_payload() {
    let mut app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/setup/initialize",
            json!({ "name": "", "email": "not-an-email", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"].get("email").is_some());
    assert!(body["fields"].get("password").is_some());
    assert_eq!(app.phase().await, "needs_initialization");
}

#[tokio::test]
async fn test_initialize_retry_after_store_failure() {
    let mut app = TestApp::new();

    app.store.set_reject_commits(true);
    let (status, body) = app.initialize().await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Initialization failed");
    assert!(app.store.is_empty().await);

    // The auth account already exists now; setup signs in to it.
    app.store.set_reject_commits(false);
    let (status, _) = app.initialize().await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, admins) = app.get("/api/admins").await;
    assert_eq!(admins.as_array().unwrap().len(), 1);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_logout_and_me() {
    let mut app = TestApp::new();
    app.initialize().await;

    let (status, body) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ROOT_EMAIL);

    let (status, _) = app.json(Method::POST, "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.login(ROOT_EMAIL, "wrong password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, body) = app.login("ROOT@library.org", ROOT_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ROOT_EMAIL);

    let (status, _) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_read_defaults_before_initialization() {
    let mut app = TestApp::new();

    let (status, body) = app.get("/api/settings/organization").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Name"], "");
    assert_eq!(body["MaximumSimultaneousLoans"], 3);

    let (status, body) = app.get("/api/settings/application").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["DefaultLoanDuration"], 14);
}

#[tokio::test]
async fn test_settings_writes_require_sign_in() {
    let mut app = TestApp::new();
    app.initialize().await;
    app.clear_cookies();

    let (status, _) = app
        .put("/api/settings/organization", configured_organization())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .put("/api/settings/application", json!({ "MaintenanceMode": true }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_partial_theme_update_is_rejected() {
    let mut app = TestApp::new();
    app.initialize().await;
    app.put("/api/settings/organization", configured_organization())
        .await;

    // Theme replaces the whole stored key, so Secondary would be lost.
    let (status, body) = app
        .put(
            "/api/settings/organization",
            json!({ "Theme": { "Primary": "#FF0000" } }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"].get("theme").is_some());

    let (_, body) = app.get("/api/settings/organization").await;
    assert_eq!(body["Theme"]["Secondary"], "#F59E0B");

    let (status, body) = app
        .put(
            "/api/settings/organization",
            json!({ "Theme": { "Primary": "#FF0000", "Secondary": "#00FF00" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Theme"]["Primary"], "#FF0000");
    assert_eq!(body["Name"], "Central Library");
}

#[tokio::test]
async fn test_structured_opening_hours_are_stored_encoded() {
    let mut app = TestApp::new();
    app.initialize().await;

    let mut update = configured_organization();
    update["OpeningHours"] = json!({
        "Monday": { "open": "09:00", "close": "17:00" },
        "Saturday": { "open": "CLOSED", "close": "closed" }
    });
    let (status, body) = app.put("/api/settings/organization", update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["OpeningHours"]["Monday"], "{\"open\":\"09:00\",\"close\":\"17:00\"}");

    let stored = app
        .store
        .get(&OrganizationSettings::path())
        .await
        .unwrap()
        .unwrap();
    let hours = stored["OpeningHours"].as_object().unwrap();
    assert_eq!(hours.len(), 7);
    assert!(hours.values().all(serde_json::Value::is_string));
    assert_eq!(hours["Saturday"], "{\"open\":\"closed\",\"close\":\"closed\"}");
}

#[tokio::test]
async fn test_application_settings_update() {
    let mut app = TestApp::new();
    app.initialize().await;

    let (status, body) = app
        .put(
            "/api/settings/application",
            json!({ "DefaultLoanDuration": 21, "MaintenanceMode": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["DefaultLoanDuration"], 21);
    assert_eq!(body["GlobalLimits"]["MaxLoansPerUser"], 5);

    let (status, _) = app
        .put("/api/settings/application", json!({ "DefaultLoanDuration": 0 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_logo_upload_stores_inline_url() {
    let mut app = TestApp::new();
    app.initialize().await;

    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let (status, bytes, _) = app.send(logo_request("image/png", &png)).await;
    assert_eq!(status, StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let logo = body["Logo"].as_str().unwrap();
    assert!(logo.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_logo_upload_rejects_unsupported_type() {
    let mut app = TestApp::new();
    app.initialize().await;

    let (status, _, _) = app.send(logo_request("application/pdf", b"%PDF-1.7")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (_, body) = app.get("/api/settings/organization").await;
    assert_eq!(body["Logo"], "");
}

// ============================================================================
// Theme
// ============================================================================

#[tokio::test]
async fn test_theme_palette_and_css() {
    let mut app = TestApp::new();

    let (status, body) = app.get("/api/theme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primary"]["base"], "#1E40AF");
    assert_eq!(body["primary"]["contrast"], "#FFFFFF");

    let request = Request::builder().uri("/theme.css").body(Body::empty()).unwrap();
    let (status, bytes, content_type) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/css"));

    let css = String::from_utf8(bytes).unwrap();
    assert!(css.starts_with(":root {"));
    assert!(css.contains("--color-primary: #1E40AF;"));
    assert!(css.contains("--color-secondary-contrast:"));
}

// ============================================================================
// Admin users
// ============================================================================

#[tokio::test]
async fn test_super_admin_creates_admin() {
    let mut app = TestApp::new();
    app.initialize().await;

    let (status, body) = app
        .post(
            "/api/admins",
            json!({
                "name": "Staff",
                "email": "staff@library.org",
                "password": "another good password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "admin");

    let (status, _) = app
        .post(
            "/api/admins",
            json!({
                "name": "Staff",
                "email": "staff@library.org",
                "password": "another good password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, admins) = app.get("/api/admins").await;
    assert_eq!(admins.as_array().unwrap().len(), 2);

    // The new admin can sign in but cannot create admins.
    app.clear_cookies();
    let (status, _) = app.login("staff@library.org", "another good password").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/admins",
            json!({
                "name": "Other",
                "email": "other@library.org",
                "password": "yet another password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_admin_reuses_leftover_auth_account() {
    let mut app = TestApp::new();
    app.initialize().await;

    // An earlier attempt created the auth account but not the admin document.
    let email = Email::parse("staff@library.org").unwrap();
    app.auth
        .sign_up(&email, &SecretString::from("another good password"), "Staff")
        .await
        .unwrap();

    let (status, _) = app
        .post(
            "/api/admins",
            json!({
                "name": "Staff",
                "email": "staff@library.org",
                "password": "not the same password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/api/admins",
            json!({
                "name": "Staff",
                "email": "staff@library.org",
                "password": "another good password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "staff@library.org");

    app.clear_cookies();
    let (status, _) = app.login("staff@library.org", "another good password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_list_requires_sign_in() {
    let mut app = TestApp::new();
    app.initialize().await;
    app.clear_cookies();

    let (status, _) = app.get("/api/admins").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[tokio::test]
async fn test_diagnostics_report_active_backends() {
    let mut app = TestApp::new();

    let (status, _) = app.get("/api/system/diagnostics").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.initialize().await;
    let (status, body) = app.get("/api/system/diagnostics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "memory");
    assert_eq!(body["auth"], "local");
    assert_eq!(body["uploader"], "inline");
}
