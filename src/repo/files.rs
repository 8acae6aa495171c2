use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, TimeZone, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::lifecycle::FileLifecycleHook;
use crate::repo::timestamp;
use crate::types::{FileChanges, FileListQuery, NewUploadedFile, UploadedFile, UploadedWithin};

pub const SELECT_FILES: &str = r#"SELECT f.id, f.owner_id, u.username AS owner_username, f.author,
           f.stored_file, f.uploaded_at, f.is_public
    FROM uploaded_files f JOIN users u ON u.id = f.owner_id"#;

/// Upload persistence. Every update and delete goes through here so the
/// registered hooks see each transition.
#[derive(Clone)]
pub struct FileRepository {
    db: SqlitePool,
    hooks: Vec<Arc<dyn FileLifecycleHook>>,
    utc_offset: FixedOffset,
}

impl FileRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db, hooks: Vec::new(), utc_offset: Utc.fix() }
    }

    /// Calendar for the date filters of [`FileRepository::list`]; UTC unless set.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn FileLifecycleHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<UploadedFile>> {
        let row = sqlx::query(&format!("{} WHERE f.id = ?1", SELECT_FILES))
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;
        row.as_ref().map(UploadedFile::from_row).transpose()
    }

    /// Lists uploads newest first. `owner_scope` restricts to one owner.
    pub async fn list(
        &self,
        owner_scope: Option<i64>,
        query: &FileListQuery,
        now: DateTime<Utc>,
    ) -> AppResult<(Vec<UploadedFile>, i64)> {
        let (limit, offset) = query.page();

        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) FROM uploaded_files f JOIN users u ON u.id = f.owner_id",
        );
        push_filters(&mut count_qb, owner_scope, query, now, self.utc_offset);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_FILES);
        push_filters(&mut qb, owner_scope, query, now, self.utc_offset);
        qb.push(" ORDER BY f.uploaded_at DESC, f.id LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb.build().fetch_all(&self.db).await?;
        let items = rows.iter().map(UploadedFile::from_row).collect::<AppResult<Vec<_>>>()?;
        Ok((items, total))
    }

    /// Inserts a new upload. The owner must already be assigned.
    pub async fn create(&self, draft: NewUploadedFile, now: DateTime<Utc>) -> AppResult<UploadedFile> {
        let owner_id = draft
            .owner_id
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("upload saved without an owner")))?;
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO uploaded_files (id, owner_id, author, stored_file, uploaded_at, is_public) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(id.to_string())
        .bind(owner_id)
        .bind(&draft.author)
        .bind(&draft.stored_file)
        .bind(timestamp(now))
        .bind(draft.is_public)
        .execute(&self.db)
        .await?;

        tracing::info!(file_id = %id, owner_id, path = %draft.stored_file, "created upload");
        self.get(id).await?.ok_or_else(|| AppError::Internal(anyhow::anyhow!("upload {} vanished after insert", id)))
    }

    /// Applies `changes`; the owner and upload time are never touched.
    pub async fn update(&self, id: Uuid, changes: FileChanges) -> AppResult<UploadedFile> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query(&format!("{} WHERE f.id = ?1", SELECT_FILES))
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let previous = match row {
            Some(r) => UploadedFile::from_row(&r)?,
            None => return Err(AppError::NotFound("file not found".into())),
        };

        let mut next = previous.clone();
        if let Some(author) = changes.author {
            next.author = author;
        }
        if let Some(stored_file) = changes.stored_file {
            next.stored_file = stored_file;
        }
        if let Some(is_public) = changes.is_public {
            next.is_public = is_public;
        }

        // Blob cleanup happens here, ahead of the UPDATE; if the UPDATE fails the
        // row still names a blob that is already gone.
        for hook in &self.hooks {
            hook.before_update(&previous, &next.stored_file).await;
        }

        sqlx::query("UPDATE uploaded_files SET author = ?1, stored_file = ?2, is_public = ?3 WHERE id = ?4")
            .bind(&next.author)
            .bind(&next.stored_file)
            .bind(next.is_public)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(file_id = %id, "updated upload");
        Ok(next)
    }

    /// Deletes the row and returns what it held.
    pub async fn delete(&self, id: Uuid) -> AppResult<UploadedFile> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query(&format!("{} WHERE f.id = ?1", SELECT_FILES))
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let record = match row {
            Some(r) => UploadedFile::from_row(&r)?,
            None => return Err(AppError::NotFound("file not found".into())),
        };

        sqlx::query("DELETE FROM uploaded_files WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(file_id = %id, "deleted upload");
        for hook in &self.hooks {
            hook.after_delete(&record).await;
        }
        Ok(record)
    }

    /// Deletes every upload of `owner_id` one by one, running the hooks for each.
    pub async fn delete_owned_by(&self, owner_id: i64) -> AppResult<u64> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM uploaded_files WHERE owner_id = ?1")
            .bind(owner_id)
            .fetch_all(&self.db)
            .await?;

        let mut deleted = 0;
        for raw in ids {
            let id = Uuid::parse_str(&raw)
                .map_err(|e| AppError::Database(format!("corrupt file id {:?}: {}", raw, e)))?;
            match self.delete(id).await {
                Ok(_) => deleted += 1,
                // Removed concurrently, nothing left to do
                Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    owner_scope: Option<i64>,
    query: &FileListQuery,
    now: DateTime<Utc>,
    utc_offset: FixedOffset,
) {
    qb.push(" WHERE 1 = 1");
    if let Some(owner) = owner_scope {
        qb.push(" AND f.owner_id = ");
        qb.push_bind(owner);
    }
    if let Some(is_public) = query.is_public {
        qb.push(" AND f.is_public = ");
        qb.push_bind(is_public);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (f.stored_file LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR f.author LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR u.username LIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\')");
    }
    if let Some(within) = query.uploaded {
        qb.push(" AND f.uploaded_at >= ");
        qb.push_bind(timestamp(uploaded_cutoff(within, now, utc_offset)));
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Earliest upload time matched by a date filter. Calendar days start at
/// midnight in `utc_offset`.
pub fn uploaded_cutoff(within: UploadedWithin, now: DateTime<Utc>, utc_offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&utc_offset);
    let midnight = |y: i32, m: u32, d: u32| {
        utc_offset
            .with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    };
    match within {
        UploadedWithin::Today => midnight(local.year(), local.month(), local.day()),
        UploadedWithin::Past7Days => midnight(local.year(), local.month(), local.day()) - Duration::days(7),
        UploadedWithin::ThisMonth => midnight(local.year(), local.month(), 1),
        UploadedWithin::ThisYear => midnight(local.year(), 1, 1),
    }
}
