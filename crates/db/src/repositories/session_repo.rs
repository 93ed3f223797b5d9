//! Repository for the `sessions` table.

use clinio_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, created_at, expires_at";

/// Provides CRUD operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, expires_at)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Physically delete a session. Returns `true` if a row was deleted.
    pub async fn delete_by_id(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all expired sessions, returning the deleted IDs.
    ///
    /// The returned list is the authoritative set for cache invalidation:
    /// callers must invalidate by these IDs rather than recomputing "is
    /// expired" themselves.
    pub async fn delete_expired(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        let ids: Vec<(DbId,)> =
            sqlx::query_as("DELETE FROM sessions WHERE expires_at < NOW() RETURNING id")
                .fetch_all(pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Delete all of a user's sessions, returning the deleted IDs.
    ///
    /// Used on password change and logout-everywhere.
    pub async fn delete_all_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let ids: Vec<(DbId,)> =
            sqlx::query_as("DELETE FROM sessions WHERE user_id = $1 RETURNING id")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
