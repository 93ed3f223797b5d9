//! Periodic sweep of expired sessions and refresh tokens.
//!
//! Expired sessions are also cleaned up lazily when a request touches them;
//! this sweep catches the ones nothing touches. Deleting a session cascades
//! to its refresh tokens, and orphaned expired refresh tokens (sessions
//! still live, token past its own expiry) are removed separately.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use clinio_db::repositories::RefreshTokenRepo;

use crate::auth::sessions::SessionManager;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 3600); // daily

/// Run the session sweep loop.
///
/// Goes through the session manager so the in-memory cache is invalidated
/// in the same step as the database delete. Runs until `cancel` is
/// triggered.
pub async fn run(pool: PgPool, sessions: Arc<SessionManager>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Session sweep job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                match sessions.delete_expired(&pool).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session sweep: purged expired sessions");
                        } else {
                            tracing::debug!("Session sweep: no expired sessions");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session sweep: session purge failed");
                    }
                }

                match RefreshTokenRepo::delete_expired(&pool).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Session sweep: purged expired refresh tokens");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Session sweep: refresh token purge failed");
                    }
                }
            }
        }
    }
}
