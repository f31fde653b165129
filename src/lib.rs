//! Lore Library Backend Library
//!
//! Identity & Access core for the Lore Library manga tracker: registration,
//! login, bearer credential verification, and role-gated authorization.
//! Exposed as a library so integration tests and binaries can assemble the
//! router themselves.

pub mod auth;
pub mod config;
pub mod middleware;
