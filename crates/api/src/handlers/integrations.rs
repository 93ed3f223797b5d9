//! Handlers for the machine client `/integrations` surface.
//!
//! `whoami` is the client-facing echo; the `/clients` sub-surface is the
//! operator side, where a logged-in user provisions and deactivates keys.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use clinio_core::client_keys::generate_client_key;
use clinio_core::error::CoreError;
use clinio_core::types::DbId;
use clinio_db::models::client::Client;
use clinio_db::repositories::ClientRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{CurrentClient, CurrentSession};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/integrations/whoami
///
/// Echo the authenticated client's record (the key hash is never
/// serialized). Useful for integrators verifying their key works.
pub async fn whoami(CurrentClient(client): CurrentClient) -> AppResult<Json<DataResponse<Client>>> {
    Ok(Json(DataResponse { data: client }))
}

/// Request body for `POST /integrations/clients`.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
}

/// A freshly provisioned client together with its plaintext key.
#[derive(Debug, Serialize)]
pub struct ProvisionedClient {
    pub client: Client,
    /// The plaintext API key. Returned exactly once; only its hash is
    /// stored, so a lost key means provisioning a new client.
    pub key: String,
}

/// POST /api/v1/integrations/clients
///
/// Provision a new machine client. Session-authenticated: operators create
/// keys, machines only use them.
pub async fn create_client(
    State(state): State<AppState>,
    _current: CurrentSession,
    Json(input): Json<CreateClientRequest>,
) -> AppResult<Json<DataResponse<ProvisionedClient>>> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Client name must not be empty".into(),
        )));
    }

    let generated = generate_client_key();
    let client = ClientRepo::create(&state.pool, name, &generated.hash, &generated.prefix).await?;

    // Make the new key usable immediately, without waiting for a read-through.
    state.clients.prime(vec![client.clone()]);
    tracing::info!(client_id = client.id, client_name = %client.name, "client provisioned");

    Ok(Json(DataResponse {
        data: ProvisionedClient {
            client,
            key: generated.plaintext,
        },
    }))
}

/// POST /api/v1/integrations/clients/{id}/deactivate
///
/// Deactivate a client and evict its cached entry so the very next key
/// check re-reads the database and sees the inactive row. Returns 204.
pub async fn deactivate_client(
    State(state): State<AppState>,
    _current: CurrentSession,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let client = ClientRepo::set_active(&state.pool, id, false)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "client",
            id,
        }))?;

    state.clients.invalidate(&client.key_hash);
    tracing::info!(client_id = client.id, client_name = %client.name, "client deactivated");

    Ok(StatusCode::NO_CONTENT)
}
