//! Success envelope for JSON handlers.
//!
//! Successful payloads cross the wire as `{ "data": ... }`, mirroring the
//! `{ "error", "code" }` envelope errors use. Handlers return a typed
//! [`DataResponse`] rather than assembling `serde_json::json!` maps, so the
//! payload type is visible in the handler signature.

use serde::Serialize;

/// The `{ "data": T }` wrapper around a successful payload.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
