//! Integration and unit tests for mediashare.
//!
//! ## Test Modules
//!
//! - **support**: shared setup (in-memory database, temp media root, router)
//! - **public_api_tests**: public download and QR code endpoints
//! - **uploads_api_tests**: admin upload API and ownership scoping
//! - **actions_api_tests**: action types, actions and their cascade
//! - **lifecycle_tests**: blob cleanup around updates and deletes
//! - **config_tests**: configuration loading and validation
//! - **db_tests**: schema and constraints
//! - **error_tests**: error mapping
//! - **health_api_tests**: health endpoints and middleware
//!
//! Individual modules can be run with e.g. `cargo test lifecycle_tests`.

pub mod support;

pub mod actions_api_tests;
pub mod error_tests;
pub mod public_api_tests;
