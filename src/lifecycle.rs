//! Lifecycle hooks run by the file repository around updates and deletes.
//!
//! Hooks are registered explicitly on [`crate::repo::files::FileRepository`].
//! They must never fail the mutation that triggered them, which is why the
//! trait methods return nothing.

use async_trait::async_trait;

use crate::metrics::Metrics;
use crate::storage::{BlobStore, StorageError};
use crate::types::UploadedFile;

#[async_trait]
pub trait FileLifecycleHook: Send + Sync {
    /// Runs inside the update transaction, before the row is written.
    /// `next_reference` is the blob path the record is about to point at.
    async fn before_update(&self, previous: &UploadedFile, next_reference: &str);

    /// Runs once the delete has been committed.
    async fn after_delete(&self, record: &UploadedFile);
}

/// Keeps the blob store in step with the records pointing into it.
#[derive(Clone)]
pub struct BlobCleanup {
    blobs: BlobStore,
    metrics: Metrics,
}

impl BlobCleanup {
    pub fn new(blobs: BlobStore, metrics: Metrics) -> Self {
        Self { blobs, metrics }
    }

    async fn remove(&self, record: &UploadedFile, path: &str, reason: &'static str) {
        match self.blobs.delete(path).await {
            Ok(()) => {
                self.metrics.inc_blobs_cleaned();
                tracing::info!(file_id = %record.id, path, reason, "deleted blob");
            }
            Err(StorageError::NotFound(_)) => {
                self.metrics.inc_blob_cleanup_failures();
                tracing::warn!(file_id = %record.id, path, reason, "blob already gone");
            }
            Err(e) => {
                self.metrics.inc_blob_cleanup_failures();
                tracing::warn!(file_id = %record.id, path, reason, "failed to delete blob: {}", e);
            }
        }
    }
}

#[async_trait]
impl FileLifecycleHook for BlobCleanup {
    async fn before_update(&self, previous: &UploadedFile, next_reference: &str) {
        if previous.stored_file.is_empty() || previous.stored_file == next_reference {
            return;
        }
        self.remove(previous, &previous.stored_file, "replaced").await;
    }

    async fn after_delete(&self, record: &UploadedFile) {
        if record.stored_file.is_empty() {
            return;
        }
        self.remove(record, &record.stored_file, "record deleted").await;
    }
}
