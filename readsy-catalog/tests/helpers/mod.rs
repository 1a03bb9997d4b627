//! Test Helper Utilities
//!
//! Shared fixtures for readsy-catalog integration tests: an on-disk catalog
//! in a temp dir, canned sources that count their calls, and the Sapiens
//! records both sources return for ISBN 9780143127796.

#![allow(dead_code)]

use async_trait::async_trait;
use readsy_catalog::db::SqliteStore;
use readsy_catalog::sources::{BookSource, SourceError};
use readsy_catalog::{ExternalRecord, Reconciler, SourceKind};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SAPIENS_ISBN: &str = "9780143127796";
pub const SAPIENS_ISBN_10: &str = "0143127799";

/// Create temporary catalog database with the schema applied
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test_readsy.db");

    let pool = readsy_common::db::init_database(&db_path)
        .await
        .expect("Failed to initialize test database");

    (temp_dir, pool)
}

/// Canned source answering every ISBN with the same record
pub struct CountingSource {
    kind: SourceKind,
    record: Option<ExternalRecord>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn returning(kind: SourceKind, record: Option<ExternalRecord>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            record,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(kind: SourceKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            record: None,
            fail: true,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(kind: SourceKind, record: Option<ExternalRecord>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            kind,
            record,
            fail: false,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookSource for CountingSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, isbn: &str) -> Result<Option<ExternalRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::Status(503, "Service Unavailable".to_string()));
        }
        Ok(self.record.clone().map(|mut record| {
            record.all_isbns.insert(isbn.to_string());
            record
        }))
    }
}

/// OpenLibrary's answer for Sapiens
pub fn sapiens_open_library() -> ExternalRecord {
    let mut record = ExternalRecord::new(SourceKind::OpenLibrary, SAPIENS_ISBN);
    record.title = Some("Sapiens".to_string());
    record.authors = vec!["Yuval Noah Harari".to_string()];
    record.open_library_id = Some("/books/OL123M".to_string());
    record
}

/// Google's answer for Sapiens
pub fn sapiens_google() -> ExternalRecord {
    let mut record = ExternalRecord::new(SourceKind::GoogleBooks, SAPIENS_ISBN);
    record.google_book_id = Some("abc123".to_string());
    record.genre_names = vec!["History".to_string()];
    record.all_isbns.insert(SAPIENS_ISBN_10.to_string());
    record
}

/// Reconciler over `pool` with the given sources and a 1s budget
pub fn reconciler(
    pool: SqlitePool,
    open_library: Arc<CountingSource>,
    google: Arc<CountingSource>,
) -> Reconciler {
    let store = Arc::new(SqliteStore::new(pool));
    Reconciler::new(
        open_library,
        google,
        store.clone(),
        store.clone(),
        store,
        Duration::from_secs(1),
    )
}
