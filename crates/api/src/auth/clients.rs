//! Machine client (API key) directory with cache-then-database lookup.
//!
//! Clients authenticate with an opaque key; only the SHA-256 hash of the
//! key is ever stored or cached. The directory is bulk-loaded at startup
//! and written through on database fallback, so the steady-state lookup
//! for a known client is a single hash plus a map read.

use sqlx::PgPool;

use clinio_core::cache::EntityCache;
use clinio_core::client_keys::hash_client_key;
use clinio_db::models::client::Client;
use clinio_db::repositories::ClientRepo;

/// Outcome of a client key check.
///
/// `Inactive` is distinct from `UnknownKey` so the caller can log a
/// deactivated client presenting its old key differently from a key that
/// was never issued. Both are rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAuth {
    /// The key belongs to an active client.
    Authenticated(Client),
    /// No client has this key.
    UnknownKey,
    /// The key belongs to a client that has been deactivated.
    Inactive(Client),
}

/// Cached directory of machine clients, keyed by key hash.
pub struct ClientDirectory {
    cache: EntityCache<String, Client>,
}

impl Default for ClientDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self {
            cache: EntityCache::new(|client: &Client| client.key_hash.clone()),
        }
    }

    /// Replace the cache contents with every client in the database.
    ///
    /// Called once at startup. Inactive clients are loaded too, so a
    /// deactivated client's key is recognized (and rejected) from cache.
    pub async fn load_all(&self, pool: &PgPool) -> Result<usize, sqlx::Error> {
        let clients = ClientRepo::list_all(pool).await?;
        let count = clients.len();
        self.cache.initialize(clients);
        Ok(count)
    }

    /// Check a plaintext key against the directory.
    ///
    /// Cache first; on a miss the database is consulted and a hit is
    /// written through. The plaintext key is hashed immediately and never
    /// retained.
    pub async fn authenticate(&self, pool: &PgPool, key: &str) -> Result<ClientAuth, sqlx::Error> {
        let key_hash = hash_client_key(key);

        let client = match self.cache.get(&key_hash) {
            Some(client) => Some(client),
            None => {
                let found = ClientRepo::find_by_key_hash(pool, &key_hash).await?;
                if let Some(ref client) = found {
                    self.cache.insert(client.clone());
                }
                found
            }
        };

        Ok(match client {
            Some(client) if client.is_active => ClientAuth::Authenticated(client),
            Some(client) => ClientAuth::Inactive(client),
            None => ClientAuth::UnknownKey,
        })
    }

    /// Drop a client's cache entry, forcing the next check to re-read the
    /// database. Called after a client row is mutated.
    pub fn invalidate(&self, key_hash: &str) {
        self.cache.remove(&key_hash.to_string());
    }

    /// Prime the cache with already-loaded clients.
    pub fn prime(&self, clients: Vec<Client>) {
        self.cache.insert_many(clients);
    }

    /// Number of clients currently cached.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://unreachable:1@127.0.0.1:1/none")
            .expect("lazy pool creation should succeed")
    }

    fn client(id: i64, key: &str, is_active: bool) -> Client {
        Client {
            id,
            name: format!("client-{id}"),
            key_hash: hash_client_key(key),
            key_prefix: key.chars().take(8).collect(),
            is_active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn active_client_authenticates_from_cache() {
        let directory = ClientDirectory::new();
        let expected = client(1, "integration-key-alpha", true);
        directory.prime(vec![expected.clone()]);

        let outcome = directory
            .authenticate(&lazy_pool(), "integration-key-alpha")
            .await
            .expect("cached lookup must not hit the database");
        assert_eq!(outcome, ClientAuth::Authenticated(expected));
    }

    #[tokio::test]
    async fn inactive_client_is_recognized_but_rejected() {
        let directory = ClientDirectory::new();
        let deactivated = client(2, "integration-key-beta", false);
        directory.prime(vec![deactivated.clone()]);

        let outcome = directory
            .authenticate(&lazy_pool(), "integration-key-beta")
            .await
            .unwrap();
        assert_eq!(outcome, ClientAuth::Inactive(deactivated));
    }

    #[tokio::test]
    async fn wrong_key_for_cached_client_misses_the_cache() {
        let directory = ClientDirectory::new();
        directory.prime(vec![client(3, "integration-key-gamma", true)]);

        // A different key hashes to a different cache slot, so the lookup
        // falls through to the (unreachable) database.
        let result = directory
            .authenticate(&lazy_pool(), "integration-key-guess")
            .await;
        assert!(result.is_err(), "cache must only match the exact key hash");
    }

    #[tokio::test]
    async fn invalidate_evicts_a_single_entry() {
        let directory = ClientDirectory::new();
        let a = client(4, "integration-key-a", true);
        let b = client(5, "integration-key-b", true);
        directory.prime(vec![a.clone(), b]);
        assert_eq!(directory.cached_count(), 2);

        directory.invalidate(&a.key_hash);
        assert_eq!(directory.cached_count(), 1);
    }
}
