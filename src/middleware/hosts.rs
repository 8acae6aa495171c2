//! `Host` header allowlist.

use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;

const DEBUG_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// Strips the port and lowercases; IPv6 literals keep their brackets.
fn normalize_host(raw: &str) -> String {
    let raw = raw.trim().to_ascii_lowercase();
    if raw.starts_with('[') {
        return match raw.find(']') {
            Some(end) => raw[..=end].to_string(),
            None => raw,
        };
    }
    let host = match raw.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host.to_string(),
        _ => raw.clone(),
    };
    host.trim_end_matches('.').to_string()
}

fn pattern_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    if pattern == "*" {
        return true;
    }
    if let Some(domain) = pattern.strip_prefix('.') {
        return host == domain || host.ends_with(&pattern);
    }
    host == pattern
}

/// Whether `raw_host` may be served. An empty list allows the local hosts in
/// debug mode and nothing otherwise.
pub fn is_allowed(allowed: &[String], debug: bool, raw_host: Option<&str>) -> bool {
    if allowed.iter().any(|p| p.trim() == "*") {
        return true;
    }
    let host = match raw_host {
        Some(h) if !h.trim().is_empty() => normalize_host(h),
        _ => return false,
    };
    if allowed.is_empty() && debug {
        return DEBUG_HOSTS.contains(&host.as_str());
    }
    allowed.iter().any(|p| pattern_matches(p, &host))
}

pub async fn allowed_hosts_middleware(State(cfg): State<Arc<AppConfig>>, req: Request, next: Next) -> Response {
    let raw_host = req
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()));

    if !is_allowed(&cfg.server.allowed_hosts, cfg.server.debug, raw_host) {
        tracing::warn!(host = ?raw_host, "rejected request for disallowed host");
        return AppError::BadRequest("Invalid Host header".into()).into_response();
    }
    next.run(req).await
}
