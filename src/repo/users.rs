use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{validation, AppError, AppResult};
use crate::repo::files::FileRepository;
use crate::types::User;

const SELECT_USERS: &str = "SELECT id, username, is_superuser, created_at FROM users";

/// Bearer tokens are stored as hex encoded SHA-256 digests.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// 64 hex characters from two random v4 UUIDs.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn validate_username(username: &str) -> AppResult<()> {
    validation::validate_not_blank(username, "username")?;
    validation::validate_max_chars(username, 150, "username")?;
    if !username.chars().all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')) {
        return Err(AppError::ValidationError {
            field: "username".into(),
            message: "Only letters, digits and @/./+/-/_ are allowed".into(),
        });
    }
    Ok(())
}

/// Creates a user with a freshly generated token; the plain token is only
/// returned here.
pub async fn create_user(db: &SqlitePool, username: &str, is_superuser: bool) -> AppResult<(User, String)> {
    let token = generate_token();
    let user = create_user_with_token(db, username, is_superuser, &token).await?;
    Ok((user, token))
}

pub async fn create_user_with_token(
    db: &SqlitePool,
    username: &str,
    is_superuser: bool,
    token: &str,
) -> AppResult<User> {
    validate_username(username)?;
    let id = sqlx::query("INSERT INTO users (username, is_superuser, token_hash) VALUES (?1, ?2, ?3)")
        .bind(username)
        .bind(is_superuser)
        .bind(hash_token(token))
        .execute(db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("user {:?} already exists", username)),
            other => other,
        })?
        .last_insert_rowid();

    tracing::info!(user_id = id, username, is_superuser, "created user");
    get_user(db, id).await?.ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {} vanished after insert", id)))
}

pub async fn get_user(db: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_USERS)).bind(id).fetch_optional(db).await?;
    row.as_ref().map(User::from_row).transpose()
}

pub async fn find_by_token(db: &SqlitePool, token: &str) -> AppResult<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE token_hash = ?1", SELECT_USERS))
        .bind(hash_token(token))
        .fetch_optional(db)
        .await?;
    row.as_ref().map(User::from_row).transpose()
}

pub async fn list_users(db: &SqlitePool) -> AppResult<Vec<User>> {
    let rows = sqlx::query(&format!("{} ORDER BY username", SELECT_USERS)).fetch_all(db).await?;
    rows.iter().map(User::from_row).collect()
}

/// Removes a user together with their uploads. Uploads are deleted through the
/// repository first so that their blobs are cleaned up too.
pub async fn delete_user(db: &SqlitePool, files: &FileRepository, id: i64) -> AppResult<u64> {
    if get_user(db, id).await?.is_none() {
        return Err(AppError::NotFound("user not found".into()));
    }
    let removed_files = files.delete_owned_by(id).await?;
    sqlx::query("DELETE FROM users WHERE id = ?1").bind(id).execute(db).await?;
    tracing::info!(user_id = id, removed_files, "deleted user");
    Ok(removed_files)
}

/// Makes sure the configured administrator exists, is a superuser and accepts
/// `token`. Safe to run on every start.
pub async fn ensure_bootstrap_admin(db: &SqlitePool, username: &str, token: &str) -> AppResult<User> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(db)
        .await?;

    match existing {
        Some(id) => {
            sqlx::query("UPDATE users SET is_superuser = 1, token_hash = ?1 WHERE id = ?2")
                .bind(hash_token(token))
                .bind(id)
                .execute(db)
                .await?;
            tracing::info!(user_id = id, username, "bootstrap admin refreshed");
            get_user(db, id).await?.ok_or_else(|| AppError::NotFound("user not found".into()))
        }
        None => create_user_with_token(db, username, true, token).await,
    }
}
