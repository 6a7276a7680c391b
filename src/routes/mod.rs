//! Router Module Index
//!
//! Splits the routing table by access level so the authentication layer is applied
//! per module in `create_router`, never per handler.

/// Routes accessible without credentials (operational probes only).
pub mod public;

/// The `/users` table. Every route here sits behind `auth_middleware`.
pub mod users;
