use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request gate ran but no session ended up bound in the request
    /// context. Equivalent to `Unauthorized` at the boundary, but logged as
    /// a defect signal: it indicates a gate ordering bug, not client error.
    #[error("No session bound in request context")]
    NoSession,

    /// Counterpart of [`CoreError::NoSession`] for client-key routes: a
    /// handler extracted a machine client the gate never bound.
    #[error("No client bound in request context")]
    NoClient,

    #[error("Internal error: {0}")]
    Internal(String),
}
