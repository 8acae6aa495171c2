use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::routes::parse_file_id;
use crate::share::content_disposition;
use crate::state::AppState;
use crate::storage::{file_name, StorageError};

/// `GET /files/{id}/` - anonymous download of a public upload.
///
/// Unknown ids and private uploads produce the same 404 so that the existence
/// of private uploads cannot be probed.
pub async fn public_file(State(state): State<AppState>, Path(raw_id): Path<String>) -> AppResult<Response> {
    let id = parse_file_id(&raw_id)?;
    let record = match state.files.get(id).await? {
        Some(r) if r.is_public => r,
        _ => return Err(AppError::NotFound("file not found".into())),
    };

    let (file, len) = match state.blobs.open(&record.stored_file).await {
        Ok(opened) => opened,
        Err(StorageError::NotFound(path)) => {
            tracing::warn!(file_id = %id, path = %path, "public upload has no blob");
            return Err(AppError::NotFound("file not found".into()));
        }
        Err(e) => return Err(e.into()),
    };
    state.metrics.record_download(len);

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(file_name(&record.stored_file)));
    Ok(response)
}
