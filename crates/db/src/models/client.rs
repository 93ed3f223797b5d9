//! Machine client (API key) model.

use clinio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A client row from the `clients` table.
///
/// Clients are provisioned out-of-band by admin tooling and are read-only
/// from the auth core's perspective. `key_hash` is never serialized; the
/// `key_prefix` field is used for human-readable identification.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}
