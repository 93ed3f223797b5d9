//! Repository for the `refresh_tokens` table.

use sqlx::PgPool;

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, session_id, signature_hash, expires_at, created_at";

/// Provides CRUD operations for persisted refresh tokens.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Persist a newly issued refresh token, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (session_id, signature_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(input.session_id)
            .bind(&input.signature_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a persisted refresh token by its signature hash.
    ///
    /// An absent row means the token was revoked (logout, rotation, sweep)
    /// and must be rejected even if its JWT signature still verifies.
    pub async fn find_by_signature_hash(
        pool: &PgPool,
        signature_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_tokens WHERE signature_hash = $1");
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(signature_hash)
            .fetch_optional(pool)
            .await
    }

    /// Delete a refresh token by signature hash. Returns `true` if deleted.
    pub async fn delete_by_signature_hash(
        pool: &PgPool,
        signature_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE signature_hash = $1")
            .bind(signature_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all expired refresh tokens. Returns the count of deleted rows.
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
