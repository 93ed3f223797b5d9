use std::sync::Arc;

use crate::auth::clients::ClientDirectory;
use crate::auth::sessions::SessionManager;
use crate::config::ServerConfig;
use crate::middleware::policy::PolicyTable;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: clinio_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Cached session store.
    pub sessions: Arc<SessionManager>,
    /// Cached machine client directory.
    pub clients: Arc<ClientDirectory>,
    /// Route authentication policies, resolved once at startup.
    pub policies: Arc<PolicyTable>,
}
