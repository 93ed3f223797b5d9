//! Session model and DTOs.

use clinio_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A session row from the `sessions` table.
///
/// One row per login event; a user may hold several concurrent sessions.
/// Deletion is physical -- an expired or revoked session is an absent row,
/// never a flagged-but-present one.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// DTO for creating a new session.
pub struct CreateSession {
    pub user_id: DbId,
    pub expires_at: Timestamp,
}
