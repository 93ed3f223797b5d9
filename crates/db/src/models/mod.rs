//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the create DTO(s) the repositories accept for inserts.

pub mod client;
pub mod refresh_token;
pub mod session;
pub mod user;
