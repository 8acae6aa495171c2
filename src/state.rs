use std::sync::Arc;

use crate::config::AppConfig;
use crate::lifecycle::BlobCleanup;
use crate::metrics::Metrics;
use crate::repo::files::FileRepository;
use crate::storage::BlobStore;

/// The shared application state.
///
/// Cheap to clone; handed to every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// Upload persistence with the blob cleanup hook registered.
    pub files: FileRepository,
    /// Where the uploaded bytes live.
    pub blobs: BlobStore,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Operational counters.
    pub metrics: Metrics,
}

impl AppState {
    /// Wires the blob store from `config.storage` and registers [`BlobCleanup`]
    /// on the file repository.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        let metrics = Metrics::new();
        let blobs = BlobStore::new(&config.storage.media_root, config.storage.upload_dir.clone());
        let files = FileRepository::new(db.clone())
            .with_utc_offset(config.server.utc_offset())
            .with_hook(Arc::new(BlobCleanup::new(blobs.clone(), metrics.clone())));

        Self { db, files, blobs, config: Arc::new(config), metrics }
    }

    pub fn download_url(&self, id: uuid::Uuid) -> String {
        crate::share::download_url(&self.config.storage.base_download_url, id)
    }
}
