//! Request authentication middleware.
//!
//! - [`policy`] -- the route-to-auth-mode table consulted by the gate.
//! - [`auth`] -- the request gate itself plus the session/client extractors.
//! - [`guards`] -- account-state guards layered on top of session auth.

pub mod auth;
pub mod guards;
pub mod policy;
