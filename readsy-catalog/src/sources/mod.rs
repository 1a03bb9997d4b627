//! External bibliographic source adapters
//!
//! Each adapter turns one source's raw ISBN lookup into a normalized
//! [`ExternalRecord`]. Raw JSON shapes stay private to the adapter module.
//!
//! # Failure contract
//! [`BookSource::fetch`] separates a genuine miss (`Ok(None)`) from an
//! unavailable source (`Err`). The engine does not care about the
//! difference: [`lookup`] degrades errors and timeouts to `None` and logs
//! them, so one broken source never fails a reconciliation call.

pub mod google_books;
mod lenient;
pub mod open_library;

pub use google_books::GoogleBooksClient;
pub use open_library::OpenLibraryClient;

use crate::types::{ExternalRecord, SourceKind};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Source adapter errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// One external bibliographic source
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Source identity, used for logging and identifier authority
    fn kind(&self) -> SourceKind;

    /// Look up one (already cleaned) ISBN
    ///
    /// # Returns
    /// - `Ok(Some(record))` on a hit
    /// - `Ok(None)` when the source has no such ISBN
    ///
    /// # Errors
    /// `SourceError` when the source could not be asked or answered garbage
    async fn fetch(&self, isbn: &str) -> Result<Option<ExternalRecord>, SourceError>;
}

/// Query one source with a time budget, degrading every failure to `None`
pub async fn lookup(source: &dyn BookSource, isbn: &str, budget: Duration) -> Option<ExternalRecord> {
    let kind = source.kind();

    let result = match tokio::time::timeout(budget, source.fetch(isbn)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(budget)),
    };

    match result {
        Ok(Some(record)) => {
            debug!(
                source = %kind,
                isbn = %isbn,
                isbn_count = record.all_isbns.len(),
                "Source returned record"
            );
            Some(record)
        }
        Ok(None) => {
            debug!(source = %kind, isbn = %isbn, "Source has no record for ISBN");
            None
        }
        Err(e) => {
            warn!(
                source = %kind,
                isbn = %isbn,
                error = %e,
                "Source unavailable, continuing without it"
            );
            None
        }
    }
}

/// Query both sources concurrently and wait for both to settle
///
/// Returns `(open_library, google)`. Neither failure nor success of one
/// source short-circuits the other.
pub async fn lookup_both(
    open_library: &dyn BookSource,
    google: &dyn BookSource,
    isbn: &str,
    budget: Duration,
) -> (Option<ExternalRecord>, Option<ExternalRecord>) {
    tokio::join!(
        lookup(open_library, isbn, budget),
        lookup(google, isbn, budget)
    )
}

/// Trim a source string; empty or whitespace-only means absent
pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First run of four ASCII digits in a free-form date ("May 2015", "2014-09-02")
pub(crate) fn first_year(date: &str) -> Option<i32> {
    let bytes = date.as_bytes();
    bytes
        .windows(4)
        .enumerate()
        .find(|(i, w)| {
            w.iter().all(u8::is_ascii_digit)
                && (*i == 0 || !bytes[i - 1].is_ascii_digit())
                && bytes.get(i + 4).map_or(true, |b| !b.is_ascii_digit())
        })
        .and_then(|(i, _)| date[i..i + 4].parse().ok())
}

/// Push each non-empty value once, keeping first-seen order
pub(crate) fn push_unique(target: &mut Vec<String>, values: impl IntoIterator<Item = String>) {
    for value in values {
        let value = value.trim().to_string();
        if value.is_empty() || target.iter().any(|existing| existing == &value) {
            continue;
        }
        target.push(value);
    }
}

// ============================================================================
// Mock Source for Testing
// ============================================================================
