//! Session lifecycle management backed by the write-through cache.
//!
//! The database is the source of truth for sessions; the in-memory cache is
//! a read accelerator. Every mutation goes to the store first and the cache
//! is updated only from the store's result, so a crash can never leave the
//! cache ahead of the database.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use clinio_core::cache::EntityCache;
use clinio_core::types::DbId;
use clinio_db::models::session::{CreateSession, Session};
use clinio_db::repositories::SessionRepo;

/// Cached session store. One instance lives in the shared application state.
pub struct SessionManager {
    cache: EntityCache<DbId, Session>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            cache: EntityCache::new(|session: &Session| session.id),
        }
    }

    /// Whether a session is still within its lifetime.
    pub fn is_live(session: &Session) -> bool {
        session.expires_at > Utc::now()
    }

    /// Create a session for `user_id` lasting `lifetime_mins` minutes.
    ///
    /// Store first, then cache: the cache entry is the row the database
    /// returned, never a locally constructed guess.
    pub async fn create(
        &self,
        pool: &PgPool,
        user_id: DbId,
        lifetime_mins: i64,
    ) -> Result<Session, sqlx::Error> {
        let session = SessionRepo::create(
            pool,
            &CreateSession {
                user_id,
                expires_at: Utc::now() + Duration::minutes(lifetime_mins),
            },
        )
        .await?;
        self.cache.insert(session.clone());
        Ok(session)
    }

    /// Look up a session by id, cache first, falling back to the database.
    ///
    /// A database hit is written through into the cache. Expiry is not
    /// checked here; use [`find_live`](Self::find_live) for that.
    pub async fn find_by_id(
        &self,
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        if let Some(session) = self.cache.get(&id) {
            return Ok(Some(session));
        }
        let found = SessionRepo::find_by_id(pool, id).await?;
        if let Some(ref session) = found {
            self.cache.insert(session.clone());
        }
        Ok(found)
    }

    /// Look up a session and return it only if it is still live.
    ///
    /// An expired session found here is cleaned up on the spot. The cleanup
    /// delete is best-effort: a failure is logged and the session is still
    /// reported absent, so the caller's rejection does not depend on the
    /// delete succeeding.
    pub async fn find_live(
        &self,
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let Some(session) = self.find_by_id(pool, id).await? else {
            return Ok(None);
        };
        if Self::is_live(&session) {
            return Ok(Some(session));
        }
        if let Err(e) = self.delete_by_id(pool, id).await {
            tracing::warn!(session_id = id, error = %e, "failed to clean up expired session");
            self.cache.remove(&id);
        }
        Ok(None)
    }

    /// Delete a session. Returns `true` if a row was deleted.
    ///
    /// The cache entry is removed whether or not the row still existed, so
    /// a stale cache entry cannot outlive its row.
    pub async fn delete_by_id(&self, pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let deleted = SessionRepo::delete_by_id(pool, id).await?;
        self.cache.remove(&id);
        Ok(deleted)
    }

    /// Delete every session belonging to `user_id`. Returns how many were
    /// deleted.
    pub async fn delete_all_for_user(
        &self,
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<usize, sqlx::Error> {
        let ids = SessionRepo::delete_all_for_user(pool, user_id).await?;
        self.cache.remove_many(ids.iter());
        Ok(ids.len())
    }

    /// Delete every expired session. Returns how many were deleted.
    ///
    /// The cache is invalidated from the set of ids the delete actually
    /// returned, not from a separate scan, so the two cannot diverge.
    pub async fn delete_expired(&self, pool: &PgPool) -> Result<usize, sqlx::Error> {
        let ids = SessionRepo::delete_expired(pool).await?;
        self.cache.remove_many(ids.iter());
        Ok(ids.len())
    }

    /// Prime the cache with already-loaded sessions.
    pub fn preload(&self, sessions: Vec<Session>) {
        self.cache.insert_many(sessions);
    }

    /// Number of sessions currently cached.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
