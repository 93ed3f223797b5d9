//! Account-state guards layered on top of session authentication.
//!
//! Each guard wraps [`CurrentSession`] and rejects requests whose user
//! account is not in the required state. Use these in route handlers to
//! enforce the requirement at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use clinio_core::error::CoreError;
use clinio_db::models::user::User;
use clinio_db::repositories::UserRepo;

use super::auth::CurrentSession;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a user who has completed registration. Rejects with 403
/// Forbidden otherwise.
///
/// ```ignore
/// async fn registered_only(RequireRegistered(current): RequireRegistered) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireRegistered(pub CurrentSession);

impl FromRequestParts<AppState> for RequireRegistered {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state).await?;
        let user = load_user(state, &current).await?;
        if !user.registration_complete {
            return Err(AppError::Core(CoreError::Forbidden(
                "Registration incomplete".into(),
            )));
        }
        Ok(RequireRegistered(current))
    }
}

/// Requires a user with an active subscription. Rejects with 403 Forbidden
/// otherwise.
///
/// ```ignore
/// async fn subscribers_only(RequireSubscribed(current): RequireSubscribed) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSubscribed(pub CurrentSession);

impl FromRequestParts<AppState> for RequireSubscribed {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state).await?;
        let user = load_user(state, &current).await?;
        if !user.subscription_active {
            return Err(AppError::Core(CoreError::Forbidden(
                "Active subscription required".into(),
            )));
        }
        Ok(RequireSubscribed(current))
    }
}

/// Fetch the session's user row. A session for a vanished user is treated
/// as unauthorized, not as a server error.
async fn load_user(state: &AppState, current: &CurrentSession) -> Result<User, AppError> {
    UserRepo::find_by_id(&state.pool, current.session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))
}
