pub mod auth;
pub mod health;
pub mod integrations;
pub mod users;

use axum::http::Method;
use axum::Router;

use crate::config::ServerConfig;
use crate::middleware::auth::request_gate;
use crate::middleware::policy::{AuthMode, PolicyTable};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login            login (public)
/// /auth/refresh          refresh (public)
/// /auth/logout           logout (requires session)
/// /auth/logout-all       logout everywhere (requires session)
///
/// /users/me              authenticated identity echo (requires session)
///
/// /integrations/whoami   client echo (requires API key)
/// /integrations/clients  client provisioning (requires session)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/integrations", integrations::router())
}

/// The authentication policy for the whole route surface.
///
/// Kept next to the route tree so the two are reviewed together. Routes
/// without an entry here fall back to the configured public-path list and
/// then to session auth, so a new route is never accidentally open.
pub fn default_policies(config: &ServerConfig) -> PolicyTable {
    PolicyTable::new(&config.public_paths)
        // Session-authenticated routes, listed explicitly even where the
        // default would already cover them.
        .route(Method::POST, "/api/v1/auth/logout", AuthMode::UserSession)
        .route(
            Method::POST,
            "/api/v1/auth/logout-all",
            AuthMode::UserSession,
        )
        .route(Method::GET, "/api/v1/users/me", AuthMode::UserSession)
        // The whole integrations surface takes client keys, except the
        // management routes beneath /clients: operators provision keys with
        // their own session, and the longer prefix wins.
        .prefix("/api/v1/integrations", AuthMode::ClientKey)
        .prefix("/api/v1/integrations/clients", AuthMode::UserSession)
}

/// Assemble the application router with the request gate applied.
///
/// Used by both the binary entrypoint and the integration tests so the two
/// always exercise the same stack. Outer infrastructure layers (tracing,
/// timeouts, CORS) are added by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Health check at root level (not under /api/v1).
        .merge(health::router())
        // API v1 routes.
        .nest("/api/v1", api_routes())
        // Every route above passes through the gate.
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_gate,
        ))
        .with_state(state)
}
