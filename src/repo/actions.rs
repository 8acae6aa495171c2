use sqlx::{Row, SqlitePool};

use crate::error::{validation, AppError, AppResult};
use crate::types::{Action, ActionType};

pub const ACTION_TYPE_NAME_MAX: usize = 50;
pub const ACTION_NAME_MAX: usize = 255;

const SELECT_ACTIONS: &str = r#"SELECT a.id, a.type_id, t.name AS type_name, a.name
    FROM actions a JOIN action_types t ON t.id = a.type_id"#;

fn validate_type_name(name: &str) -> AppResult<()> {
    validation::validate_not_blank(name, "name")?;
    validation::validate_max_chars(name, ACTION_TYPE_NAME_MAX, "name")
}

fn validate_action_name(name: &str) -> AppResult<()> {
    validation::validate_not_blank(name, "name")?;
    validation::validate_max_chars(name, ACTION_NAME_MAX, "name")
}

fn duplicate_name(e: sqlx::Error, name: &str) -> AppError {
    match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("action type {:?} already exists", name)),
        other => other,
    }
}

pub async fn list_action_types(db: &SqlitePool) -> AppResult<Vec<ActionType>> {
    let rows = sqlx::query("SELECT id, name FROM action_types ORDER BY name").fetch_all(db).await?;
    Ok(rows.iter().map(|r| ActionType { id: r.get("id"), name: r.get("name") }).collect())
}

pub async fn get_action_type(db: &SqlitePool, id: i64) -> AppResult<Option<ActionType>> {
    let row = sqlx::query("SELECT id, name FROM action_types WHERE id = ?1").bind(id).fetch_optional(db).await?;
    Ok(row.map(|r| ActionType { id: r.get("id"), name: r.get("name") }))
}

pub async fn create_action_type(db: &SqlitePool, name: &str) -> AppResult<ActionType> {
    let name = name.trim();
    validate_type_name(name)?;
    let id = sqlx::query("INSERT INTO action_types (name) VALUES (?1)")
        .bind(name)
        .execute(db)
        .await
        .map_err(|e| duplicate_name(e, name))?
        .last_insert_rowid();
    tracing::info!(action_type_id = id, name, "created action type");
    Ok(ActionType { id, name: name.to_string() })
}

pub async fn rename_action_type(db: &SqlitePool, id: i64, name: &str) -> AppResult<ActionType> {
    let name = name.trim();
    validate_type_name(name)?;
    let res = sqlx::query("UPDATE action_types SET name = ?1 WHERE id = ?2")
        .bind(name)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| duplicate_name(e, name))?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("action type not found".into()));
    }
    Ok(ActionType { id, name: name.to_string() })
}

/// Deletes the type; its actions go with it through the foreign key cascade.
/// Returns the number of actions that were removed.
pub async fn delete_action_type(db: &SqlitePool, id: i64) -> AppResult<i64> {
    let mut tx = db.begin().await?;
    let dependents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actions WHERE type_id = ?1")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    let res = sqlx::query("DELETE FROM action_types WHERE id = ?1").bind(id).execute(&mut *tx).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("action type not found".into()));
    }
    tx.commit().await?;
    tracing::info!(action_type_id = id, cascaded_actions = dependents, "deleted action type");
    Ok(dependents)
}

pub async fn list_actions(db: &SqlitePool, type_id: Option<i64>) -> AppResult<Vec<Action>> {
    let rows = match type_id {
        Some(t) => {
            sqlx::query(&format!("{} WHERE a.type_id = ?1 ORDER BY t.name, a.name, a.id", SELECT_ACTIONS))
                .bind(t)
                .fetch_all(db)
                .await?
        }
        None => sqlx::query(&format!("{} ORDER BY t.name, a.name, a.id", SELECT_ACTIONS)).fetch_all(db).await?,
    };
    Ok(rows.iter().map(action_from_row).collect())
}

pub async fn get_action(db: &SqlitePool, id: i64) -> AppResult<Option<Action>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?1", SELECT_ACTIONS)).bind(id).fetch_optional(db).await?;
    Ok(row.as_ref().map(action_from_row))
}

pub async fn create_action(db: &SqlitePool, type_id: i64, name: &str) -> AppResult<Action> {
    validate_action_name(name)?;
    require_type(db, type_id).await?;
    let id = sqlx::query("INSERT INTO actions (type_id, name) VALUES (?1, ?2)")
        .bind(type_id)
        .bind(name)
        .execute(db)
        .await?
        .last_insert_rowid();
    get_action(db, id).await?.ok_or_else(|| AppError::Internal(anyhow::anyhow!("action {} vanished after insert", id)))
}

pub async fn update_action(db: &SqlitePool, id: i64, type_id: i64, name: &str) -> AppResult<Action> {
    validate_action_name(name)?;
    require_type(db, type_id).await?;
    let res = sqlx::query("UPDATE actions SET type_id = ?1, name = ?2 WHERE id = ?3")
        .bind(type_id)
        .bind(name)
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("action not found".into()));
    }
    get_action(db, id).await?.ok_or_else(|| AppError::NotFound("action not found".into()))
}

pub async fn delete_action(db: &SqlitePool, id: i64) -> AppResult<()> {
    let res = sqlx::query("DELETE FROM actions WHERE id = ?1").bind(id).execute(db).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("action not found".into()));
    }
    Ok(())
}

async fn require_type(db: &SqlitePool, type_id: i64) -> AppResult<()> {
    if get_action_type(db, type_id).await?.is_none() {
        return Err(AppError::ValidationError {
            field: "type_id".into(),
            message: format!("action type {} does not exist", type_id),
        });
    }
    Ok(())
}

fn action_from_row(r: &sqlx::sqlite::SqliteRow) -> Action {
    Action { id: r.get("id"), type_id: r.get("type_id"), type_name: r.get("type_name"), name: r.get("name") }
}
