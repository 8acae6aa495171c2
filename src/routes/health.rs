use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Health check endpoint - lightweight
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: checks DB connectivity and the media root with timeout protection
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => return (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
    match tokio::fs::metadata(state.blobs.root()).await {
        Ok(m) if m.is_dir() => (StatusCode::OK, "ready").into_response(),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "not ready: media root missing").into_response(),
    }
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let body = format!(
        "# HELP mediashare_files_uploaded Files uploaded\n# TYPE mediashare_files_uploaded counter\nmediashare_files_uploaded {}\n\
# HELP mediashare_files_deleted Files deleted\n# TYPE mediashare_files_deleted counter\nmediashare_files_deleted {}\n\
# HELP mediashare_public_downloads Public downloads served\n# TYPE mediashare_public_downloads counter\nmediashare_public_downloads {}\n\
# HELP mediashare_bytes_served Bytes served by public downloads\n# TYPE mediashare_bytes_served counter\nmediashare_bytes_served {}\n\
# HELP mediashare_qr_codes_rendered QR codes rendered\n# TYPE mediashare_qr_codes_rendered counter\nmediashare_qr_codes_rendered {}\n\
# HELP mediashare_blobs_cleaned Blobs removed by lifecycle hooks\n# TYPE mediashare_blobs_cleaned counter\nmediashare_blobs_cleaned {}\n\
# HELP mediashare_blob_cleanup_failures Failed blob removals\n# TYPE mediashare_blob_cleanup_failures counter\nmediashare_blob_cleanup_failures {}\n\
# HELP mediashare_uptime_seconds Uptime seconds\n# TYPE mediashare_uptime_seconds gauge\nmediashare_uptime_seconds {}\n",
        m.files_uploaded,
        m.files_deleted,
        m.public_downloads,
        m.bytes_served,
        m.qr_codes_rendered,
        m.blobs_cleaned,
        m.blob_cleanup_failures,
        m.uptime_seconds,
    );
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
