//! Authentication and authorization primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- signed access/refresh token issuance and verification.
//! - [`sessions`] -- session lifecycle with the write-through cache.
//! - [`clients`] -- machine client (API key) directory.

pub mod clients;
pub mod jwt;
pub mod password;
pub mod sessions;
