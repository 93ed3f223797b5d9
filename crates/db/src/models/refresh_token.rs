//! Refresh token model and DTOs.

use clinio_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A refresh token row from the `refresh_tokens` table.
///
/// Access tokens are stateless and never persisted; refresh tokens are
/// persisted (by the SHA-256 of their signature segment) so they can be
/// revoked on logout, rotation, or by the expiry sweep.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub session_id: DbId,
    pub signature_hash: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for persisting a newly issued refresh token.
pub struct CreateRefreshToken {
    pub session_id: DbId,
    pub signature_hash: String,
    pub expires_at: Timestamp,
}
