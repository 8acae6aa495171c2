//! Local blob store for uploaded files.
//!
//! Blobs live under the configured media root and are addressed by a relative,
//! forward-slash separated path such as `uploads/2024/05/report.pdf`. That
//! relative path is what records persist as their file reference.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

const SUFFIX_LEN: usize = 7;
const MAX_NAME_ATTEMPTS: usize = 100;

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    upload_dir: String,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>, upload_dir: impl Into<String>) -> Self {
        let upload_dir = upload_dir.into().trim_matches('/').to_string();
        Self { root: root.into(), upload_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `data` under `<upload_dir>/<YYYY>/<MM>/` and returns the relative path.
    ///
    /// The name is sanitised first; an existing blob is never overwritten, a random
    /// suffix is inserted before the extension instead.
    pub async fn save(&self, original_name: &str, data: &[u8], now: DateTime<Utc>) -> Result<String, StorageError> {
        let name = sanitize_file_name(original_name)?;
        let mut dir = if self.upload_dir.is_empty() { String::new() } else { format!("{}/", self.upload_dir) };
        dir.push_str(&format!("{:04}/{:02}", now.year(), now.month()));

        fs::create_dir_all(self.root.join(&dir)).await?;

        let mut candidate = name.clone();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let relative = format!("{}/{}", dir, candidate);
            let full = self.root.join(&relative);
            match fs::OpenOptions::new().write(true).create_new(true).open(&full).await {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    tracing::debug!(path = %relative, bytes = data.len(), "stored blob");
                    return Ok(relative);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = with_random_suffix(&name);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("could not find a free name for {:?}", name),
        )))
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(relative)?;
        match fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(relative.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Opens a blob for streaming and returns it with its length in bytes.
    pub async fn open(&self, relative: &str) -> Result<(fs::File, u64), StorageError> {
        let full = self.resolve(relative)?;
        let file = match fs::File::open(&full).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(relative.to_string())),
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(relative.to_string()));
        }
        Ok((file, meta.len()))
    }

    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(full) => fs::metadata(full).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn delete(&self, relative: &str) -> Result<(), StorageError> {
        let full = self.resolve(relative)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(relative.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Maps a relative blob path onto the media root, refusing anything that could
    /// escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        if relative.is_empty() || relative.contains('\0') || relative.contains('\\') {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        let path = Path::new(relative);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

/// Last segment of a blob path, used as the download file name.
pub fn file_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

/// Reduces an uploaded name to a safe single path segment.
///
/// Directory parts are dropped, whitespace becomes `_` and only alphanumerics
/// (any script) plus `-`, `_` and `.` survive.
pub fn sanitize_file_name(original: &str) -> Result<String, StorageError> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(StorageError::InvalidName(original.to_string()));
    }
    Ok(cleaned)
}

fn with_random_suffix(name: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(SUFFIX_LEN).collect();
    match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}_{}{}", &name[..idx], suffix, &name[idx..]),
        _ => format!("{}_{}", name, suffix),
    }
}
