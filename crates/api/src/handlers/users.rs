//! Handlers for the `/users` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use clinio_core::error::CoreError;
use clinio_core::types::{DbId, Timestamp};
use clinio_db::models::user::UserResponse;
use clinio_db::repositories::UserRepo;

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentSession;
use crate::middleware::guards::{RequireRegistered, RequireSubscribed};
use crate::response::DataResponse;
use crate::state::AppState;

/// The caller's identity as established by the gate.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: DbId,
    pub email: String,
    pub session_id: DbId,
    pub session_expires_at: Timestamp,
}

/// GET /api/v1/users/me
///
/// Echo the authenticated identity. Served entirely from the gate's bound
/// session; no database access.
pub async fn me(current: CurrentSession) -> AppResult<Json<DataResponse<MeResponse>>> {
    Ok(Json(DataResponse {
        data: MeResponse {
            user_id: current.session.user_id,
            email: current.email,
            session_id: current.session.id,
            session_expires_at: current.session.expires_at,
        },
    }))
}

/// GET /api/v1/users/me/profile
///
/// Full account record. Requires a completed registration.
pub async fn profile(
    State(state): State<AppState>,
    RequireRegistered(current): RequireRegistered,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, current.session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// Subscription standing returned by the entitlements endpoint.
#[derive(Debug, Serialize)]
pub struct EntitlementsResponse {
    pub subscription_active: bool,
}

/// GET /api/v1/users/me/entitlements
///
/// Reachable only with an active subscription; by construction the flag in
/// the response is `true`. Integrating frontends poll this to detect a
/// lapsed subscription (it turns into a 403).
pub async fn entitlements(
    RequireSubscribed(_current): RequireSubscribed,
) -> AppResult<Json<DataResponse<EntitlementsResponse>>> {
    Ok(Json(DataResponse {
        data: EntitlementsResponse {
            subscription_active: true,
        },
    }))
}

/// Request body for `PUT /users/me/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/v1/users/me/password
///
/// Change the caller's password. The current password must be presented
/// again; on success every session the user holds is revoked, including the
/// one making the request, so the caller must log in again. Returns 204.
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    // 1. Re-read the user row; the stored hash is needed for verification.
    let user = UserRepo::find_by_id(&state.pool, current.session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    // 2. Prove possession of the current password before anything changes.
    let valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    // 3. Validate and hash the replacement.
    validate_password_strength(&input.new_password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // 4. Store the new hash, then revoke every session (refresh tokens go
    //    with them via cascade).
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;
    let revoked = state
        .sessions
        .delete_all_for_user(&state.pool, user.id)
        .await?;
    tracing::info!(
        user_id = user.id,
        sessions = revoked,
        "password changed; all sessions revoked"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/me/complete-registration
///
/// Mark the caller's registration as finished. Returns 204 No Content, or
/// 409 if it was already complete.
pub async fn complete_registration(
    State(state): State<AppState>,
    current: CurrentSession,
) -> AppResult<StatusCode> {
    let updated = UserRepo::complete_registration(&state.pool, current.session.user_id).await?;
    if !updated {
        return Err(AppError::Core(CoreError::Conflict(
            "Registration already complete".into(),
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
