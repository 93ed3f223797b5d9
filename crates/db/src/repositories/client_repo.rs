//! Repository for the `clients` table.

use clinio_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::Client;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, key_hash, key_prefix, is_active, created_at";

/// Provides read and provisioning operations for machine clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Provision a new client. Returns the created row.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (name, key_hash, key_prefix)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(name)
            .bind(key_hash)
            .bind(key_prefix)
            .fetch_one(pool)
            .await
    }

    /// Find a client by the SHA-256 hash of its key.
    ///
    /// Returns inactive clients too: the caller distinguishes "unknown key"
    /// from "known but deactivated" for audit purposes.
    pub async fn find_by_key_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE key_hash = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(key_hash)
            .fetch_optional(pool)
            .await
    }

    /// List every client, active and inactive.
    ///
    /// Used by the startup bulk load of the client cache.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients ORDER BY id");
        sqlx::query_as::<_, Client>(&query).fetch_all(pool).await
    }

    /// Activate or deactivate a client. Returns the updated row, or `None`
    /// if no client has that id. The caller is responsible for invalidating
    /// any cached copy.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        active: bool,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("UPDATE clients SET is_active = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(pool)
            .await
    }
}
