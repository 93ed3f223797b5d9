//! Background jobs spawned at startup.

pub mod session_sweep;
