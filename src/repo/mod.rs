//! Persistence for the record types.
//!
//! - `files`: uploads, with lifecycle hooks around update and delete
//! - `actions`: action types and the actions that reference them
//! - `users`: principals and their bearer tokens

pub mod actions;
pub mod files;
pub mod users;

use chrono::{DateTime, SecondsFormat, Utc};

/// Canonical timestamp format for stored rows. Fixed width, so string order is
/// chronological order.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
