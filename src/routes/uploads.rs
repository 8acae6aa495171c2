use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::error::{validation, AppError, AppResult};
use crate::middleware::AuthUser;
use crate::policy::{assign_owner, visible_to, Principal};
use crate::qr;
use crate::routes::parse_file_id;
use crate::state::AppState;
use crate::storage::file_name;
use crate::types::{FileChanges, FileListQuery, FileListResponse, NewUploadedFile, UploadedFile, UploadedFileDto};

const AUTHOR_MAX: usize = 255;

fn to_dto(state: &AppState, record: UploadedFile, with_preview: bool) -> AppResult<UploadedFileDto> {
    let download_url = state.download_url(record.id);
    let qr_code_preview = if with_preview { Some(qr::preview_data_uri(&download_url)?) } else { None };
    Ok(UploadedFileDto {
        id: record.id,
        owner: record.owner_username,
        author: record.author,
        file_name: file_name(&record.stored_file).to_string(),
        stored_file: record.stored_file,
        uploaded_at: record.uploaded_at,
        is_public: record.is_public,
        qr_code_url: format!("/{}/download_qr_code/", record.id),
        download_url,
        qr_code_preview,
    })
}

/// Fields of the upload form. Absent fields stay `None`.
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    author: Option<String>,
    is_public: Option<bool>,
}

/// Reads the form; `max_file_bytes` bounds the file part alone.
async fn read_upload_form(mut multipart: Multipart, max_file_bytes: usize) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let data = field.bytes().await?;
                if data.is_empty() {
                    return Err(AppError::ValidationError {
                        field: "file".into(),
                        message: "The submitted file is empty".into(),
                    });
                }
                if data.len() > max_file_bytes {
                    return Err(AppError::ValidationError {
                        field: "file".into(),
                        message: format!("The submitted file exceeds {} bytes", max_file_bytes),
                    });
                }
                form.file = Some((name, data.to_vec()));
            }
            "author" => {
                let author = field.text().await?.trim().to_string();
                validation::validate_max_chars(&author, AUTHOR_MAX, "author")?;
                form.author = Some(author);
            }
            "is_public" => {
                form.is_public = Some(validation::parse_bool(&field.text().await?, "is_public")?);
            }
            other => {
                tracing::debug!("Ignoring unknown upload field: {}", other);
            }
        }
    }
    Ok(form)
}

/// Loads an upload the principal is allowed to see; others are not found.
async fn load_visible(state: &AppState, principal: &Principal, raw_id: &str) -> AppResult<UploadedFile> {
    let id = parse_file_id(raw_id)?;
    match state.files.get(id).await? {
        Some(r) if principal.can_view(&r) => Ok(r),
        _ => Err(AppError::NotFound("file not found".into())),
    }
}

pub async fn list_files(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> AppResult<impl IntoResponse> {
    let (records, total) = state.files.list(principal.owner_scope(), &query, Utc::now()).await?;
    let (limit, offset) = query.page();

    let items = visible_to(&principal, records)
        .into_iter()
        .map(|r| to_dto(&state, r, true))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(FileListResponse { items, total, limit, offset }))
}

pub async fn get_file(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = load_visible(&state, &principal, &raw_id).await?;
    Ok(Json(to_dto(&state, record, true)?))
}

pub async fn create_file(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    if !principal.can_change(None) {
        return Err(AppError::Forbidden("Not allowed to upload".into()));
    }
    let form = read_upload_form(multipart, state.config.storage.max_upload_bytes).await?;
    let (name, data) = form.file.ok_or_else(|| AppError::ValidationError {
        field: "file".into(),
        message: "A file is required".into(),
    })?;

    let now = Utc::now();
    let stored_file = state.blobs.save(&name, &data, now).await?;
    let mut draft = NewUploadedFile {
        owner_id: None,
        author: form.author.unwrap_or_default(),
        stored_file: stored_file.clone(),
        is_public: form.is_public.unwrap_or(false),
    };
    assign_owner(&mut draft, &principal);

    let record = match state.files.create(draft, now).await {
        Ok(r) => r,
        Err(e) => {
            // Nothing references the blob yet
            if let Err(cleanup) = state.blobs.delete(&stored_file).await {
                tracing::warn!(path = %stored_file, "failed to remove blob of rejected upload: {}", cleanup);
            }
            return Err(e);
        }
    };
    state.metrics.inc_files_uploaded();

    Ok((StatusCode::CREATED, Json(to_dto(&state, record, false)?)))
}

pub async fn update_file(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let existing = load_visible(&state, &principal, &raw_id).await?;
    if !principal.can_change(Some(&existing)) {
        return Err(AppError::Forbidden("Not allowed to change this file".into()));
    }

    let form = read_upload_form(multipart, state.config.storage.max_upload_bytes).await?;
    let new_blob = match form.file {
        Some((name, data)) => Some(state.blobs.save(&name, &data, Utc::now()).await?),
        None => None,
    };
    let changes = FileChanges { author: form.author, stored_file: new_blob.clone(), is_public: form.is_public };
    if changes.is_empty() {
        return Ok(Json(to_dto(&state, existing, false)?));
    }

    match state.files.update(existing.id, changes).await {
        Ok(updated) => Ok(Json(to_dto(&state, updated, false)?)),
        Err(e) => {
            if let Some(path) = new_blob {
                if let Err(cleanup) = state.blobs.delete(&path).await {
                    tracing::warn!(path = %path, "failed to remove blob of rejected update: {}", cleanup);
                }
            }
            Err(e)
        }
    }
}

pub async fn delete_file(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let existing = load_visible(&state, &principal, &raw_id).await?;
    if !principal.can_delete(Some(&existing)) {
        return Err(AppError::Forbidden("Not allowed to delete this file".into()));
    }
    state.files.delete(existing.id).await?;
    state.metrics.inc_files_deleted();
    Ok(StatusCode::NO_CONTENT)
}
