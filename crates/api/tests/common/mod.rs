use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use clinio_api::auth::clients::ClientDirectory;
use clinio_api::auth::jwt::JwtConfig;
use clinio_api::auth::sessions::SessionManager;
use clinio_api::config::ServerConfig;
use clinio_api::routes;
use clinio_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and fixed JWT secrets.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        session_expiry_mins: 720,
        public_paths: vec![
            "/health".to_string(),
            "/api/v1/auth/login".to_string(),
            "/api/v1/auth/refresh".to_string(),
        ],
        jwt: JwtConfig {
            access_secret: "test-access-secret-with-enough-entropy".to_string(),
            refresh_secret: "test-refresh-secret-with-enough-entropy".to_string(),
            issuer: "clinio-test".to_string(),
            access_expiry_mins: 15,
            refresh_expiry_days: 7,
        },
    }
}

/// A pool that never actually connects. Tests that prime the caches stay
/// off the database entirely; anything that falls through to a query gets
/// a connection error, which is itself an assertable outcome.
pub fn lazy_pool() -> PgPool {
    // A short acquire timeout keeps the connection error well inside the
    // 30 s request timeout, so tests observe the handler's error response
    // rather than a 408 from the timeout layer.
    sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy("postgres://unreachable:1@127.0.0.1:1/none")
        .expect("lazy pool creation should succeed")
}

/// The assembled application plus handles to the stores the tests prime.
pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<SessionManager>,
    pub clients: Arc<ClientDirectory>,
    pub config: ServerConfig,
}

/// Build the full application router with all middleware layers, backed by
/// an unreachable pool and empty caches.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (gate, CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
pub fn build_test_app() -> TestApp {
    build_test_app_with_pool(lazy_pool())
}

/// Same as [`build_test_app`], over a real (migrated) database pool. Used by
/// the `#[sqlx::test]` flows.
pub fn build_test_app_with_pool(pool: PgPool) -> TestApp {
    let config = test_config();
    let sessions = Arc::new(SessionManager::new());
    let clients = Arc::new(ClientDirectory::new());
    let policies = Arc::new(routes::default_policies(&config));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sessions: Arc::clone(&sessions),
        clients: Arc::clone(&clients),
        policies,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = routes::app(state)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors);

    TestApp {
        router,
        sessions,
        clients,
        config,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// GET a path with no headers.
pub async fn get(router: Router, path: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete")
}

/// GET a path with a Bearer token.
pub async fn get_auth(router: Router, path: &str, token: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .uri(path)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete")
}

/// GET a path with an arbitrary extra header.
pub async fn get_with_header(router: Router, path: &str, name: &str, value: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .uri(path)
                .header(name, value)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete")
}

/// POST a JSON body with no credentials (login, refresh).
pub async fn post_json(router: Router, path: &str, body: serde_json::Value) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build"),
        )
        .await
        .expect("request should complete")
}

/// PUT a JSON body with a Bearer token.
pub async fn put_json_auth(
    router: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(path)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build"),
        )
        .await
        .expect("request should complete")
}

/// POST a JSON body with a Bearer token.
pub async fn post_json_auth(
    router: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build"),
        )
        .await
        .expect("request should complete")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}
