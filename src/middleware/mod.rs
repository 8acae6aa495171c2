//! Middleware components for HTTP request processing.
//!
//! - `auth`: bearer token extractors yielding the calling principal
//! - `hosts`: `Host` header allowlist
//! - `security_headers`: security and caching headers on every response

pub mod auth;
pub mod hosts;
pub mod security_headers;

pub use auth::{AuthUser, RequireSuperuser};
