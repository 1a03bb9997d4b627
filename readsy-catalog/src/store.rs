//! Local catalog capabilities required by the reconciliation engine
//!
//! The engine only talks to these traits; [`crate::db::SqliteStore`]
//! implements all three over one SQLite pool. Every method returns
//! `readsy_common::Result`, and a `Database` error aborts the call.

use crate::types::{Author, CatalogEntry, DuplicateCriteria, ExternalIdKind, Genre, IdentifierBackfill};
use async_trait::async_trait;
use readsy_common::Result;
use uuid::Uuid;

/// Read and backfill access to catalog entries
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Entry owning `isbn`, if any
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<CatalogEntry>>;

    /// Entry carrying an external identifier
    async fn find_by_external_id(
        &self,
        kind: ExternalIdKind,
        value: &str,
    ) -> Result<Option<CatalogEntry>>;

    /// Entry with a case-insensitively equal title by the given author
    async fn find_by_title_and_author(
        &self,
        title: &str,
        author_id: Uuid,
    ) -> Result<Option<CatalogEntry>>;

    /// First entry (insertion order) matching any present clause of `criteria`
    ///
    /// Returns `Ok(None)` without querying when `criteria` has no clause.
    async fn find_duplicate(&self, criteria: &DuplicateCriteria) -> Result<Option<CatalogEntry>>;

    /// Every entry by the author, in insertion order
    async fn find_all_by_author(&self, author_id: Uuid) -> Result<Vec<CatalogEntry>>;

    /// Backfill null identifiers and append ISBNs in one transaction
    ///
    /// Never overwrites a non-null identifier; ISBNs already present (on this
    /// or another entry) are skipped. Returns the entry re-read afterwards.
    async fn apply_sync(
        &self,
        entry_id: Uuid,
        backfill: &IdentifierBackfill,
        isbns: &[String],
    ) -> Result<CatalogEntry>;
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Author by bare OpenLibrary key
    async fn find_by_external_id(&self, open_library_id: &str) -> Result<Option<Author>>;

    /// Author whose name equals `name` ignoring case (first inserted wins)
    async fn find_by_name_case_insensitive(&self, name: &str) -> Result<Option<Author>>;
}

#[async_trait]
pub trait GenreStore: Send + Sync {
    /// Existing genres whose names match any of `names`, ignoring case
    async fn find_by_names_case_insensitive(&self, names: &[String]) -> Result<Vec<Genre>>;

    /// Insert genres, silently skipping names that already exist
    async fn create_many(&self, names: &[String]) -> Result<()>;
}
