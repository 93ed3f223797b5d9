//! Handlers for the `/auth` resource (login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use clinio_core::error::CoreError;
use clinio_core::hashing::sha256_hex;
use clinio_core::types::DbId;
use clinio_db::models::refresh_token::CreateRefreshToken;
use clinio_db::models::user::{User, UserResponse};
use clinio_db::repositories::{RefreshTokenRepo, UserRepo};

use crate::auth::jwt::{self, TokenClass};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentSession;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// On refresh this is the same token the caller sent unless it was
    /// close enough to expiry to be rotated.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Creates a session and returns access
/// and refresh tokens bound to it.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Find user by email. The same message is returned for an unknown
    //    email and a wrong password.
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    // 2. Verify password. This happens before the active check so a
    //    deactivated account is indistinguishable from an unknown one
    //    until the caller has proven they hold the credentials.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        )));
    }

    // 3. Identity proven; now reject deactivated accounts.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 4. Create the session (store first, then cache).
    let session = state
        .sessions
        .create(&state.pool, user.id, state.config.session_expiry_mins)
        .await?;

    // 5. Issue both tokens against the new session.
    let access = issue_token(TokenClass::Access, &user.email, session.id, &state)?;
    let refresh_token = issue_and_persist_refresh(&state, &user.email, session.id).await?;

    Ok(Json(AuthResponse {
        access_token: access.token,
        refresh_token,
        expires_in: state.config.jwt.access_expiry_mins * 60,
        user: user.into(),
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid, non-revoked refresh token for a new access token.
/// The refresh token itself is rotated only when it is within the rotation
/// threshold of its own expiry; otherwise the caller keeps using it.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Verify the token cryptographically (signature, issuer, expiry).
    let claims = jwt::decode_claims(&input.refresh_token, TokenClass::Refresh, &state.config.jwt)
        .ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ))
    })?;

    // 2. The token must still be on record: a missing row means it was
    //    revoked by logout, rotation, or the sweep.
    let signature = jwt::signature_of(&input.refresh_token)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Malformed refresh token".into())))?;
    let signature_hash = sha256_hex(signature.as_bytes());

    let stored = RefreshTokenRepo::find_by_signature_hash(&state.pool, &signature_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Refresh token revoked".into()))
        })?;

    if stored.session_id != claims.sid {
        // Claims and stored row disagree about the session. Treat as
        // revoked rather than trusting either side.
        tracing::error!(
            token_session = stored.session_id,
            claim_session = claims.sid,
            "refresh token session mismatch"
        );
        return Err(AppError::Core(CoreError::Unauthorized(
            "Refresh token revoked".into(),
        )));
    }

    // 3. The session the token references must still be live.
    let session = state
        .sessions
        .find_live(&state.pool, claims.sid)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Session expired or revoked".into()))
        })?;

    // 4. The user must still exist and be active.
    let user = load_active_user(&state, session.user_id).await?;

    // 5. Always issue a fresh access token.
    let access = issue_token(TokenClass::Access, &user.email, session.id, &state)?;

    // 6. Rotate the refresh token only when it is near its own expiry.
    let refresh_token = if jwt::needs_rotation(stored.expires_at.timestamp(), Utc::now().timestamp())
    {
        RefreshTokenRepo::delete_by_signature_hash(&state.pool, &signature_hash).await?;
        issue_and_persist_refresh(&state, &user.email, session.id).await?
    } else {
        input.refresh_token
    };

    Ok(Json(AuthResponse {
        access_token: access.token,
        refresh_token,
        expires_in: state.config.jwt.access_expiry_mins * 60,
        user: user.into(),
    }))
}

/// POST /api/v1/auth/logout
///
/// Delete the current session. Its refresh tokens go with it (cascade).
/// Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> AppResult<StatusCode> {
    state
        .sessions
        .delete_by_id(&state.pool, current.session.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout-all
///
/// Delete every session belonging to the current user. Returns 204 No
/// Content.
pub async fn logout_all(
    State(state): State<AppState>,
    current: CurrentSession,
) -> AppResult<StatusCode> {
    let count = state
        .sessions
        .delete_all_for_user(&state.pool, current.session.user_id)
        .await?;
    tracing::info!(
        user_id = current.session.user_id,
        sessions = count,
        "logged out everywhere"
    );
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Issue a token, mapping the (practically impossible) encoding failure to
/// an internal error.
fn issue_token(
    class: TokenClass,
    email: &str,
    session_id: DbId,
    state: &AppState,
) -> Result<jwt::IssuedToken, AppError> {
    jwt::issue(class, email, session_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}

/// Issue a refresh token and persist the hash of its signature segment.
async fn issue_and_persist_refresh(
    state: &AppState,
    email: &str,
    session_id: DbId,
) -> AppResult<String> {
    let issued = issue_token(TokenClass::Refresh, email, session_id, state)?;

    let signature = jwt::signature_of(&issued.token)
        .ok_or_else(|| AppError::InternalError("Issued token has no signature".into()))?;

    RefreshTokenRepo::create(
        &state.pool,
        &CreateRefreshToken {
            session_id,
            signature_hash: sha256_hex(signature.as_bytes()),
            expires_at: chrono::DateTime::from_timestamp(issued.expires_at, 0)
                .ok_or_else(|| AppError::InternalError("Token expiry out of range".into()))?,
        },
    )
    .await?;

    Ok(issued.token)
}

/// Fetch a user and require the account to be active.
async fn load_active_user(state: &AppState, user_id: DbId) -> Result<User, AppError> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }
    Ok(user)
}
