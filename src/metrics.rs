use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub files_uploaded: Arc<AtomicU64>,
    pub files_deleted: Arc<AtomicU64>,
    pub public_downloads: Arc<AtomicU64>,
    pub bytes_served: Arc<AtomicU64>,
    pub qr_codes_rendered: Arc<AtomicU64>,
    pub blobs_cleaned: Arc<AtomicU64>,
    pub blob_cleanup_failures: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            files_uploaded: Arc::new(AtomicU64::new(0)),
            files_deleted: Arc::new(AtomicU64::new(0)),
            public_downloads: Arc::new(AtomicU64::new(0)),
            bytes_served: Arc::new(AtomicU64::new(0)),
            qr_codes_rendered: Arc::new(AtomicU64::new(0)),
            blobs_cleaned: Arc::new(AtomicU64::new(0)),
            blob_cleanup_failures: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_files_uploaded(&self) {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_files_deleted(&self) {
        self.files_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self, bytes: u64) {
        self.public_downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn inc_qr_codes_rendered(&self) {
        self.qr_codes_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blobs_cleaned(&self) {
        self.blobs_cleaned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blob_cleanup_failures(&self) {
        self.blob_cleanup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            public_downloads: self.public_downloads.load(Ordering::Relaxed),
            bytes_served: self.bytes_served.load(Ordering::Relaxed),
            qr_codes_rendered: self.qr_codes_rendered.load(Ordering::Relaxed),
            blobs_cleaned: self.blobs_cleaned.load(Ordering::Relaxed),
            blob_cleanup_failures: self.blob_cleanup_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub files_uploaded: u64,
    pub files_deleted: u64,
    pub public_downloads: u64,
    pub bytes_served: u64,
    pub qr_codes_rendered: u64,
    pub blobs_cleaned: u64,
    pub blob_cleanup_failures: u64,
    pub uptime_seconds: u64,
}
