//! HTTP route handlers.
//!
//! - `public`: anonymous download of public uploads
//! - `qr_codes`: QR code image of an upload's share link
//! - `uploads`: admin API for uploads, scoped by ownership
//! - `actions`: admin API for action types and actions
//! - `users`: superuser-only user management
//! - `health`: health, readiness, metrics and version endpoints

pub mod actions;
pub mod health;
pub mod public;
pub mod qr_codes;
pub mod uploads;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{hosts::allowed_hosts_middleware, security_headers::security_headers_middleware};
use crate::state::AppState;

/// Room for multipart boundaries, part headers and the text fields on top of
/// `max_upload_bytes`, which bounds the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Upload ids arrive as raw path segments; anything that is not a UUID is
/// simply not found.
pub(crate) fn parse_file_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("file not found".into()))
}

/// Builds the application router with state, body limit, security headers and
/// the host allowlist applied. Tracing, compression and CORS are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    let cfg = state.config.clone();

    let mut app = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        // The canonical share link has no trailing slash
        .route("/files/{id}", get(public::public_file))
        .route("/files/{id}/", get(public::public_file))
        .route("/{id}/download_qr_code/", get(qr_codes::download_qr_code))
        .route("/admin/files", get(uploads::list_files).post(uploads::create_file))
        .route(
            "/admin/files/{id}",
            get(uploads::get_file).patch(uploads::update_file).delete(uploads::delete_file),
        )
        .route("/admin/action-types", get(actions::list_action_types).post(actions::create_action_type))
        .route(
            "/admin/action-types/{id}",
            get(actions::get_action_type).put(actions::update_action_type).delete(actions::delete_action_type),
        )
        .route("/admin/actions", get(actions::list_actions).post(actions::create_action))
        .route(
            "/admin/actions/{id}",
            get(actions::get_action).put(actions::update_action).delete(actions::delete_action),
        )
        .route("/admin/users", get(users::list_users).post(users::create_user))
        .route("/admin/users/{id}", delete(users::delete_user));

    // Development convenience, a reverse proxy serves media in production
    if cfg.server.debug {
        let prefix = cfg.storage.media_url.trim_end_matches('/');
        if !prefix.is_empty() {
            app = app.nest_service(prefix, ServeDir::new(&cfg.storage.media_root));
        }
    }

    app.with_state(state)
        .layer(DefaultBodyLimit::max(cfg.storage.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)))
        .layer(from_fn_with_state(cfg.clone(), security_headers_middleware))
        .layer(from_fn_with_state(cfg, allowed_hosts_middleware))
}
