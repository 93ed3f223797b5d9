//! Clinio core primitives.
//!
//! This crate has no internal dependencies so its contents (shared types,
//! the domain error enum, the in-memory cache, client key utilities) can be
//! used by both the persistence layer and the API server.

pub mod cache;
pub mod client_keys;
pub mod error;
pub mod hashing;
pub mod types;
