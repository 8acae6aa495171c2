use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireSuperuser;
use crate::repo::users as repo;
use crate::state::AppState;
use crate::types::{CreateUserRequest, CreateUserResponse};

pub async fn list_users(_admin: RequireSuperuser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(repo::list_users(&state.db).await?))
}

pub async fn create_user(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let (user, token) = repo::create_user(&state.db, req.username.trim(), req.is_superuser).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse { id: user.id, username: user.username, is_superuser: user.is_superuser, token }),
    ))
}

/// Deletes a user and, through the file repository, all of their uploads.
pub async fn delete_user(
    RequireSuperuser(admin): RequireSuperuser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if admin.user_id == id {
        return Err(AppError::BadRequest("Refusing to delete the calling user".into()));
    }
    let removed_files = repo::delete_user(&state.db, &state.files, id).await?;
    Ok(Json(json!({ "deleted": id, "removed_files": removed_files })))
}
