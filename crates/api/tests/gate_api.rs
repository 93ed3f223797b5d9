//! HTTP-level integration tests for the request gate.
//!
//! These tests run without a database: the session and client caches are
//! primed directly, and the pool never connects. Every request therefore
//! exercises the real middleware stack and the cache-hit paths the gate
//! takes in steady state.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};

use clinio_api::auth::jwt::{self, TokenClass};
use clinio_core::client_keys::hash_client_key;
use clinio_core::types::DbId;
use clinio_db::models::client::Client;
use clinio_db::models::session::Session;

use common::{body_json, get, get_auth, get_with_header, post_json_auth};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn live_session(id: DbId, user_id: DbId) -> Session {
    let now = Utc::now();
    Session {
        id,
        user_id,
        created_at: now,
        expires_at: now + Duration::minutes(720),
    }
}

fn test_client(id: DbId, key: &str, is_active: bool) -> Client {
    Client {
        id,
        name: format!("integration-{id}"),
        key_hash: hash_client_key(key),
        key_prefix: key.chars().take(8).collect(),
        is_active,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Public routes
// ---------------------------------------------------------------------------

/// /health needs no credentials and reports a degraded status when the
/// database is unreachable.
#[tokio::test]
async fn test_health_is_public() {
    let app = common::build_test_app();

    let response = get(app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}

// ---------------------------------------------------------------------------
// Session-authenticated routes
// ---------------------------------------------------------------------------

/// A session route with no Authorization header returns 401.
#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = common::build_test_app();

    let response = get(app.router, "/api/v1/users/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

/// A non-Bearer Authorization header returns 401.
#[tokio::test]
async fn test_malformed_authorization_header_is_rejected() {
    let app = common::build_test_app();

    let response = get_with_header(
        app.router,
        "/api/v1/users/me",
        "authorization",
        "Token abcdef",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A token with a flipped byte fails signature verification.
#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let app = common::build_test_app();
    app.sessions.preload(vec![live_session(1, 10)]);

    let issued = jwt::issue(TokenClass::Access, "doc@clinic.test", 1, &app.config.jwt)
        .expect("issuance should succeed");
    let mut tampered = issued.token.clone();
    let last = tampered.pop().expect("token is non-empty");
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = get_auth(app.router, "/api/v1/users/me", &tampered).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A refresh token presented as an access token is rejected: the two
/// classes are signed with independent keys.
#[tokio::test]
async fn test_refresh_token_cannot_act_as_access_token() {
    let app = common::build_test_app();
    app.sessions.preload(vec![live_session(1, 10)]);

    let refresh = jwt::issue(TokenClass::Refresh, "doc@clinic.test", 1, &app.config.jwt)
        .expect("issuance should succeed");

    let response = get_auth(app.router, "/api/v1/users/me", &refresh.token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A valid token referencing a live cached session reaches the handler.
#[tokio::test]
async fn test_valid_token_with_live_session_succeeds() {
    let app = common::build_test_app();
    let session = live_session(7, 42);
    app.sessions.preload(vec![session.clone()]);

    let issued = jwt::issue(TokenClass::Access, "doc@clinic.test", 7, &app.config.jwt)
        .expect("issuance should succeed");

    let response = get_auth(app.router, "/api/v1/users/me", &issued.token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["user_id"], 42);
    assert_eq!(json["data"]["session_id"], 7);
    assert_eq!(json["data"]["email"], "doc@clinic.test");
}

/// A cryptographically valid token whose session has expired is rejected.
#[tokio::test]
async fn test_expired_session_is_rejected() {
    let app = common::build_test_app();
    let now = Utc::now();
    app.sessions.preload(vec![Session {
        id: 9,
        user_id: 42,
        created_at: now - Duration::minutes(800),
        expires_at: now - Duration::minutes(5),
    }]);

    let issued = jwt::issue(TokenClass::Access, "doc@clinic.test", 9, &app.config.jwt)
        .expect("issuance should succeed");

    let response = get_auth(app.router, "/api/v1/users/me", &issued.token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Logout with a tampered token never reaches the handler.
#[tokio::test]
async fn test_logout_requires_valid_token() {
    let app = common::build_test_app();

    let response = post_json_auth(
        app.router,
        "/api/v1/auth/logout",
        "not-a-real-token",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Guard-wrapped routes sit behind the same gate: no token, no handler.
#[tokio::test]
async fn test_profile_requires_session() {
    let app = common::build_test_app();

    let response = get(app.router, "/api/v1/users/me/profile").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A route with no policy entry falls back to session auth, so an
/// unauthenticated request is rejected before routing can 404.
#[tokio::test]
async fn test_unlisted_route_fails_closed() {
    let app = common::build_test_app();

    let response = get(app.router, "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Client-key routes
// ---------------------------------------------------------------------------

/// A client route with no API key header returns 401.
#[tokio::test]
async fn test_missing_api_key_is_rejected() {
    let app = common::build_test_app();

    let response = get(app.router, "/api/v1/integrations/whoami").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A valid key for an active client reaches the handler, and the response
/// never exposes the key hash.
#[tokio::test]
async fn test_valid_api_key_identifies_client() {
    let app = common::build_test_app();
    app.clients
        .prime(vec![test_client(3, "clinic-portal-key-001", true)]);

    let response = get_with_header(
        app.router,
        "/api/v1/integrations/whoami",
        "client-key",
        "clinic-portal-key-001",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], 3);
    assert_eq!(json["data"]["name"], "integration-3");
    assert!(
        json["data"].get("key_hash").is_none(),
        "key hash must never be serialized"
    );
}

/// A deactivated client's key is recognized from cache but rejected.
#[tokio::test]
async fn test_inactive_client_key_is_rejected() {
    let app = common::build_test_app();
    app.clients
        .prime(vec![test_client(4, "clinic-portal-key-002", false)]);

    let response = get_with_header(
        app.router,
        "/api/v1/integrations/whoami",
        "client-key",
        "clinic-portal-key-002",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
