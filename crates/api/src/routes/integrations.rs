//! Route definitions for the machine client `/integrations` surface.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::integrations;
use crate::state::AppState;

/// Routes mounted at `/integrations`.
///
/// `/whoami` authenticates with a client API key; the `/clients` management
/// routes are used by operators and take a user session instead (the policy
/// table carries the more specific prefix entry).
///
/// ```text
/// GET  /whoami                   -> authenticated client echo (API key)
/// POST /clients                  -> provision a client (session)
/// POST /clients/{id}/deactivate  -> deactivate a client (session)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/whoami", get(integrations::whoami))
        .route("/clients", post(integrations::create_client))
        .route(
            "/clients/{id}/deactivate",
            post(integrations::deactivate_client),
        )
}
