use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::{AppResult, OptionExt};
use crate::middleware::{AuthUser, RequireSuperuser};
use crate::repo::actions as repo;
use crate::state::AppState;
use crate::types::{ActionDto, ActionListQuery, ActionRequest, ActionTypeRequest};

pub async fn list_action_types(_user: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(repo::list_action_types(&state.db).await?))
}

pub async fn get_action_type(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(repo::get_action_type(&state.db, id).await?.ok_or_not_found("action type")?))
}

pub async fn create_action_type(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Json(req): Json<ActionTypeRequest>,
) -> AppResult<impl IntoResponse> {
    let created = repo::create_action_type(&state.db, &req.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_action_type(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ActionTypeRequest>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(repo::rename_action_type(&state.db, id, &req.name).await?))
}

pub async fn delete_action_type(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let removed_actions = repo::delete_action_type(&state.db, id).await?;
    Ok(Json(json!({ "deleted": id, "removed_actions": removed_actions })))
}

pub async fn list_actions(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ActionListQuery>,
) -> AppResult<impl IntoResponse> {
    let items: Vec<ActionDto> =
        repo::list_actions(&state.db, query.type_id).await?.into_iter().map(ActionDto::from).collect();
    Ok(Json(items))
}

pub async fn get_action(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let action = repo::get_action(&state.db, id).await?.ok_or_not_found("action")?;
    Ok(Json(ActionDto::from(action)))
}

pub async fn create_action(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Json(req): Json<ActionRequest>,
) -> AppResult<impl IntoResponse> {
    let created = repo::create_action(&state.db, req.type_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(ActionDto::from(created))))
}

pub async fn update_action(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ActionRequest>,
) -> AppResult<impl IntoResponse> {
    let updated = repo::update_action(&state.db, id, req.type_id, &req.name).await?;
    Ok(Json(ActionDto::from(updated)))
}

pub async fn delete_action(
    _admin: RequireSuperuser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    repo::delete_action(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
