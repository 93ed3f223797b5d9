//! The request gate: one middleware that enforces every route's declared
//! authentication mode before the handler runs.
//!
//! The gate resolves the request's [`AuthMode`] from the policy table,
//! performs the corresponding check, and binds the authenticated principal
//! ([`CurrentSession`] or [`CurrentClient`]) into the request extensions.
//! Handlers recover the principal with the extractors below; a handler that
//! extracts [`CurrentSession`] on a route the gate left open surfaces the
//! misconfiguration as [`CoreError::NoSession`].

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use clinio_core::error::CoreError;
use clinio_db::models::client::Client;
use clinio_db::models::session::Session;

use crate::auth::clients::ClientAuth;
use crate::auth::jwt::{self, TokenClass};
use crate::error::AppError;
use crate::middleware::policy::AuthMode;
use crate::state::AppState;

/// Header carrying a machine client's API key.
pub const CLIENT_KEY_HEADER: &str = "client-key";

/// The authenticated user session bound by the gate.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// The live session row the access token referenced.
    pub session: Session,
    /// The user's email, from the token's subject claim.
    pub email: String,
}

/// The authenticated machine client bound by the gate.
#[derive(Debug, Clone)]
pub struct CurrentClient(pub Client);

/// Gate middleware. Layered once, outermost of the application layers, so
/// every route passes through it.
pub async fn request_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mode = state.policies.resolve(req.method(), req.uri().path());

    match mode {
        AuthMode::None => {}
        AuthMode::UserSession => {
            let current = check_user_session(&state, req.headers()).await?;
            req.extensions_mut().insert(current);
        }
        AuthMode::ClientKey => {
            let current = check_client_key(&state, req.headers()).await?;
            req.extensions_mut().insert(current);
        }
    }

    Ok(next.run(req).await)
}

/// Verify the Bearer access token and resolve its session.
async fn check_user_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<CurrentSession, AppError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })?;

    let claims = jwt::decode_claims(token, TokenClass::Access, &state.config.jwt)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    // A valid token is not enough: the session it references must still be
    // live. Logout and the sweep both work by deleting the session row.
    let session = state
        .sessions
        .find_live(&state.pool, claims.sid)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Session expired or revoked".into()))
        })?;

    Ok(CurrentSession {
        session,
        email: claims.sub,
    })
}

/// Verify the API key header against the client directory.
async fn check_client_key(state: &AppState, headers: &HeaderMap) -> Result<CurrentClient, AppError> {
    let key = headers
        .get(CLIENT_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing API key".into())))?;

    match state.clients.authenticate(&state.pool, key).await? {
        ClientAuth::Authenticated(client) => Ok(CurrentClient(client)),
        ClientAuth::Inactive(client) => {
            tracing::warn!(
                client_id = client.id,
                client_name = %client.name,
                "deactivated client presented its key"
            );
            Err(AppError::Core(CoreError::Unauthorized(
                "Invalid API key".into(),
            )))
        }
        ClientAuth::UnknownKey => Err(AppError::Core(CoreError::Unauthorized(
            "Invalid API key".into(),
        ))),
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(AppError::Core(CoreError::NoSession))
    }
}

impl FromRequestParts<AppState> for CurrentClient {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentClient>()
            .cloned()
            .ok_or(AppError::Core(CoreError::NoClient))
    }
}
