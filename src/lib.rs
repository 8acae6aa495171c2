//! # mediashare
//!
//! Backend for uploading files, publishing them behind a random link and
//! handing out a QR code of that link.
//!
//! ## Architecture
//!
//! - **Axum** for HTTP routing and extractors
//! - **SQLx** with SQLite for the records
//! - **Tokio** for the runtime and file I/O
//! - **qrcode** + **image** for QR rendering
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (embedded defaults, file, environment)
//! - [`db`]: schema initialization
//! - [`error`]: `AppError` and its HTTP mapping
//! - [`lifecycle`]: hooks that keep blobs in step with records
//! - [`metrics`]: operational counters
//! - [`middleware`]: authentication, host allowlist, security headers
//! - [`policy`]: ownership and visibility rules
//! - [`qr`]: QR code rendering
//! - [`repo`]: persistence for uploads, actions and users
//! - [`routes`]: HTTP handlers and the router
//! - [`share`]: share links and `Content-Disposition`
//! - [`state`]: shared application state
//! - [`storage`]: blob store under the media root
//! - [`types`]: records and DTOs

pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod middleware;
pub mod policy;
pub mod qr;
pub mod repo;
pub mod routes;
pub mod share;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;
