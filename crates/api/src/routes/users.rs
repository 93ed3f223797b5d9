//! Route definitions for the `/users` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`. All require a session.
///
/// ```text
/// GET  /me                        -> authenticated identity echo
/// GET  /me/profile                -> full account record (registered users)
/// GET  /me/entitlements           -> subscription standing (subscribers)
/// POST /me/complete-registration  -> finish registration
/// PUT  /me/password               -> change password (revokes all sessions)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me))
        .route("/me/profile", get(users::profile))
        .route("/me/entitlements", get(users::entitlements))
        .route("/me/complete-registration", post(users::complete_registration))
        .route("/me/password", put(users::change_password))
}
