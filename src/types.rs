use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A stored upload. `stored_file` is the blob path relative to the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: Uuid,
    pub owner_id: i64,
    pub owner_username: String,
    pub author: String,
    pub stored_file: String,
    pub uploaded_at: String,
    pub is_public: bool,
}

impl UploadedFile {
    /// Maps a row selected with the columns of `repo::files::SELECT_FILES`.
    pub fn from_row(r: &SqliteRow) -> AppResult<Self> {
        let raw_id: String = r.try_get("id")?;
        let id = Uuid::parse_str(&raw_id)
            .map_err(|e| AppError::Database(format!("corrupt file id {:?}: {}", raw_id, e)))?;
        Ok(Self {
            id,
            owner_id: r.try_get("owner_id")?,
            owner_username: r.try_get("owner_username")?,
            author: r.try_get("author")?,
            stored_file: r.try_get("stored_file")?,
            uploaded_at: r.try_get("uploaded_at")?,
            is_public: r.try_get("is_public")?,
        })
    }
}

/// Input for a new upload before it is persisted.
#[derive(Debug, Clone)]
pub struct NewUploadedFile {
    /// Filled in by the ownership policy on first save when absent.
    pub owner_id: Option<i64>,
    pub author: String,
    pub stored_file: String,
    pub is_public: bool,
}

/// Partial update of an upload. `None` leaves the column untouched; the owner
/// is not part of it.
#[derive(Debug, Clone, Default)]
pub struct FileChanges {
    pub author: Option<String>,
    pub stored_file: Option<String>,
    pub is_public: Option<bool>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.stored_file.is_none() && self.is_public.is_none()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub created_at: String,
}

impl User {
    pub fn from_row(r: &SqliteRow) -> AppResult<Self> {
        Ok(Self {
            id: r.try_get("id")?,
            username: r.try_get("username")?,
            is_superuser: r.try_get("is_superuser")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: i64,
    pub type_id: i64,
    pub type_name: String,
    pub name: String,
}

impl Action {
    pub fn display(&self) -> String {
        format!("{}: {}", self.type_name, self.name)
    }
}

// DTOs for the admin API

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFileDto {
    pub id: Uuid,
    pub owner: String,
    pub author: String,
    pub stored_file: String,
    pub file_name: String,
    pub uploaded_at: String,
    pub is_public: bool,
    pub download_url: String,
    pub qr_code_url: String,
    /// `data:image/png;base64,...` preview, only filled in listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_preview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    pub items: Vec<UploadedFileDto>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Date filters offered on the upload listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadedWithin {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileListQuery {
    pub is_public: Option<bool>,
    pub search: Option<String>,
    pub uploaded: Option<UploadedWithin>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

impl FileListQuery {
    /// The `(limit, offset)` actually applied: limit within `1..=MAX_PAGE_SIZE`,
    /// offset not negative.
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionTypeRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub type_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionListQuery {
    pub type_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDto {
    pub id: i64,
    pub type_id: i64,
    pub type_name: String,
    pub name: String,
    pub display: String,
}

impl From<Action> for ActionDto {
    fn from(a: Action) -> Self {
        let display = a.display();
        Self { id: a.id, type_id: a.type_id, type_name: a.type_name, name: a.name, display }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    /// Shown exactly once; only its hash is stored.
    pub token: String,
}
