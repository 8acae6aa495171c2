use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::error::{AppResult, OptionExt};
use crate::middleware::AuthUser;
use crate::qr;
use crate::routes::parse_file_id;
use crate::state::AppState;

/// `GET /{id}/download_qr_code/` - print-size QR code of the share link.
///
/// Any signed-in user may fetch it for any upload: the payload is the public
/// link itself. Rendered fresh on every request.
pub async fn download_qr_code(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let id = parse_file_id(&raw_id)?;
    let record = state.files.get(id).await?.ok_or_not_found("file")?;

    let png = qr::print_png(&state.download_url(record.id))?;
    state.metrics.inc_qr_codes_rendered();
    tracing::debug!(file_id = %id, user = %principal.username, bytes = png.len(), "rendered QR code");

    let mut response = Body::from(png).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    let disposition = format!("attachment; filename=\"{}_qr_code.png\"", record.id);
    if let Ok(v) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    Ok(response)
}
