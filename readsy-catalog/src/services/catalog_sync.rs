//! Catalog sync onto an exact duplicate
//!
//! Computes what a matched entry is missing (null identifiers, unknown
//! ISBNs) and hands that plan to [`CatalogStore::apply_sync`], which
//! writes it in one transaction. Re-running with the same inputs writes
//! nothing.

use crate::store::CatalogStore;
use crate::types::{CanonicalRecord, CatalogEntry, IdentifierBackfill};
use readsy_common::Result;
use tracing::{debug, info};

/// Identifiers and ISBNs to add to one entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub backfill: IdentifierBackfill,
    pub new_isbns: Vec<String>,
}

impl SyncPlan {
    /// Diff `canonical` against `entry`; existing values are never replaced
    pub fn diff(entry: &CatalogEntry, canonical: &CanonicalRecord) -> Self {
        let backfill = IdentifierBackfill {
            google_book_id: if entry.google_book_id.is_none() {
                canonical.google_book_id.clone()
            } else {
                None
            },
            open_library_id: if entry.open_library_id.is_none() {
                canonical.open_library_id.clone()
            } else {
                None
            },
        };

        let new_isbns = canonical
            .all_isbns
            .difference(&entry.isbns)
            .cloned()
            .collect();

        Self { backfill, new_isbns }
    }

    pub fn is_empty(&self) -> bool {
        self.backfill.is_empty() && self.new_isbns.is_empty()
    }
}

/// Bring `entry` up to date with `canonical` and return it re-read
pub async fn sync(
    entry: &CatalogEntry,
    canonical: &CanonicalRecord,
    catalog: &dyn CatalogStore,
) -> Result<CatalogEntry> {
    let plan = SyncPlan::diff(entry, canonical);

    if plan.is_empty() {
        debug!(book_id = %entry.id, "Catalog entry already up to date");
    } else {
        info!(
            book_id = %entry.id,
            google_book_id = ?plan.backfill.google_book_id,
            open_library_id = ?plan.backfill.open_library_id,
            new_isbns = ?plan.new_isbns,
            "Syncing catalog entry"
        );
    }

    catalog
        .apply_sync(entry.id, &plan.backfill, &plan.new_isbns)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{save_book, NewBook};
    use crate::db::{test_pool, SqliteStore};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn canonical(isbns: &[&str]) -> CanonicalRecord {
        CanonicalRecord {
            google_book_id: Some("abc123".to_string()),
            open_library_id: Some("/books/OL123M".to_string()),
            author_external_id: None,
            title: Some("Sapiens".to_string()),
            authors: Vec::new(),
            description: None,
            genre_names: Vec::new(),
            page_count: None,
            publisher: None,
            original_publication_year: None,
            all_isbns: isbns.iter().map(|s| s.to_string()).collect(),
            resolved_author_id: None,
        }
    }

    #[test]
    fn test_diff_never_overwrites() {
        let entry = CatalogEntry {
            id: Uuid::new_v4(),
            title: "Sapiens".to_string(),
            author_id: None,
            google_book_id: Some("existing".to_string()),
            open_library_id: None,
            isbns: BTreeSet::from(["9780143127796".to_string()]),
        };

        let plan = SyncPlan::diff(&entry, &canonical(&["9780143127796", "0143127799"]));

        assert!(plan.backfill.google_book_id.is_none());
        assert_eq!(plan.backfill.open_library_id.as_deref(), Some("/books/OL123M"));
        assert_eq!(plan.new_isbns, vec!["0143127799"]);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let store = SqliteStore::new(test_pool().await);

        let mut book = NewBook::new("Sapiens");
        book.isbns.insert("9780143127796".to_string());
        let entry = save_book(store.pool(), &book).await.unwrap();

        let record = canonical(&["9780143127796", "0143127799"]);

        let first = sync(&entry, &record, &store).await.unwrap();
        assert_eq!(first.google_book_id.as_deref(), Some("abc123"));
        assert_eq!(first.open_library_id.as_deref(), Some("/books/OL123M"));
        assert_eq!(first.isbns.len(), 2);

        assert!(SyncPlan::diff(&first, &record).is_empty());
        let second = sync(&first, &record, &store).await.unwrap();
        assert_eq!(second, first);
    }
}
