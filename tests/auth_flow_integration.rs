//! End-to-end exercises of the identity routes against a throwaway SQLite
//! store, driving the assembled router directly.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use lore_library_backend::auth::{self, AccountStore, AuthState, JwtHandler};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-secret";

fn test_app_with_ttl(ttl_secs: i64) -> (Router, Arc<JwtHandler>, NamedTempFile) {
    let temp = NamedTempFile::new().unwrap();
    let store = Arc::new(AccountStore::new(temp.path().to_str().unwrap()).unwrap());
    let jwt = Arc::new(JwtHandler::new(TEST_SECRET.to_string(), ttl_secs));
    let app = auth::router(AuthState::new(store, jwt.clone()));
    (app, jwt, temp)
}

fn test_app() -> (Router, Arc<JwtHandler>, NamedTempFile) {
    test_app_with_ttl(3600)
}

async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, username: &str, password: &str, role: Option<&str>) -> (StatusCode, Value) {
    let mut body = json!({"username": username, "password": password});
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    send(app, Method::POST, "/api/auth/register", None, Some(body)).await
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await
}

#[tokio::test]
async fn register_issues_credential_and_sanitized_account() {
    let (app, _, _temp) = test_app();

    let (status, body) =
        register(&app, "lore_reader1", "Secr3t!", Some("User")).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(body["account"]["username"], "lore_reader1");
    assert_eq!(body["account"]["role"], "User");
    assert!(body["account"].get("password").is_none());
    assert!(body["account"].get("password_hash").is_none());

    let token = body["credential"]["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(body["credential"]["expires_in"], 3600);

    // Credential is immediately usable on a protected endpoint
    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "lore_reader1");
}

#[tokio::test]
async fn register_rejects_malformed_usernames_without_creating_accounts() {
    let (app, _, _temp) = test_app();

    for bad in ["ab", "way_too_long_for_the_policy", "has space", "dot.name", ""] {
        let (status, body) = register(&app, bad, "Secr3t!", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "username {bad:?}");
        assert_eq!(body["error"], "invalid_username");

        // No account was created
        let (status, _) = login(&app, bad, "Secr3t!").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let (app, _, _temp) = test_app();

    let (status, _) = register(&app, "taken_name", "first-pass", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "taken_name", "second-pass", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username_taken");
}

#[tokio::test]
async fn register_rejects_unrecognized_role() {
    let (app, _, _temp) = test_app();

    let (status, body) = register(&app, "lore_reader1", "Secr3t!", Some("Moderator")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_role");
}

#[tokio::test]
async fn register_defaults_omitted_role_to_user() {
    let (app, _, _temp) = test_app();

    let (status, body) = register(&app, "lore_reader1", "Secr3t!", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["role"], "User");
}

#[tokio::test]
async fn login_round_trip_and_enumeration_resistance() {
    let (app, _, _temp) = test_app();

    register(&app, "lore_reader1", "Secr3t!", Some("User")).await;

    let (status, body) = login(&app, "lore_reader1", "Secr3t!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["username"], "lore_reader1");
    assert!(!body["credential"]["token"].as_str().unwrap().is_empty());

    // Wrong password and unknown username are byte-identical failures
    let (wrong_status, wrong_body) = login(&app, "lore_reader1", "wrong").await;
    let (unknown_status, unknown_body) = login(&app, "doesnotexist", "Secr3t!").await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "invalid_credentials");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_invalid_credentials() {
    let (app, _, _temp) = test_app();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_credential");

    let (status, body) =
        send(&app, Method::GET, "/api/auth/me", Some("garbage.token.here"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credential");

    // Signed with a different secret
    let other = JwtHandler::new("some-other-secret".to_string(), 3600);
    let (forged, _) = other.issue(&Uuid::new_v4()).unwrap();
    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credential");
}

#[tokio::test]
async fn credential_for_missing_account_is_rejected() {
    let (app, jwt, _temp) = test_app();

    // Valid signature, but the subject was never registered
    let (token, _) = jwt.issue(&Uuid::new_v4()).unwrap();
    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unknown_account");
}

#[tokio::test]
async fn expired_credential_is_rejected() {
    let (app, _, _temp) = test_app_with_ttl(-60);

    let (status, body) = register(&app, "lore_reader1", "Secr3t!", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["credential"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credential");
}

#[tokio::test]
async fn change_password_swaps_login_credentials() {
    let (app, _, _temp) = test_app();

    let (_, body) = register(&app, "lore_reader1", "old-pass", Some("Creator")).await;
    let token = body["credential"]["token"].as_str().unwrap().to_string();

    // Wrong current password is rejected and changes nothing
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/change-password",
        Some(&token),
        Some(json!({"currentPassword": "not-it", "newPassword": "new-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
    let (status, _) = login(&app, "lore_reader1", "old-pass").await;
    assert_eq!(status, StatusCode::OK);

    // Correct current password swaps the hash
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users/change-password",
        Some(&token),
        Some(json!({"currentPassword": "old-pass", "newPassword": "new-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "lore_reader1", "old-pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Username and role survive the change
    let (status, body) = login(&app, "lore_reader1", "new-pass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["username"], "lore_reader1");
    assert_eq!(body["account"]["role"], "Creator");
}

#[tokio::test]
async fn admin_listing_is_role_gated() {
    let (app, _, _temp) = test_app();

    let (_, body) = register(&app, "lore_reader1", "Secr3t!", Some("User")).await;
    let user_token = body["credential"]["token"].as_str().unwrap().to_string();

    let (status, body) =
        send(&app, Method::GET, "/api/admin/accounts", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (_, body) = register(&app, "librarian", "Secr3t!", Some("Admin")).await;
    let admin_token = body["credential"]["token"].as_str().unwrap().to_string();

    let (status, body) =
        send(&app, Method::GET, "/api/admin/accounts", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let accounts = body.as_array().unwrap();
    assert_eq!(accounts.len(), 2);
    for account in accounts {
        assert!(account.get("password_hash").is_none());
        assert!(account.get("password").is_none());
    }
}

#[tokio::test]
async fn logout_is_client_side_discard_only() {
    let (app, _, _temp) = test_app();

    let (_, body) = register(&app, "lore_reader1", "Secr3t!", None).await;
    let token = body["credential"]["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // No server-side revocation: the credential stays valid until expiry
    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}
