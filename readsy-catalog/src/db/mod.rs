//! Database access for readsy-catalog
//!
//! Free functions per table (`books`, `authors`, `genres`) plus
//! [`SqliteStore`], which exposes them through the store traits the
//! reconciliation engine depends on.

pub mod authors;
pub mod books;
pub mod genres;

use crate::store::{AuthorStore, CatalogStore, GenreStore};
use crate::types::{Author, CatalogEntry, DuplicateCriteria, ExternalIdKind, Genre, IdentifierBackfill};
use async_trait::async_trait;
use readsy_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Catalog, author and genre store over one SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<CatalogEntry>> {
        books::find_by_isbn(&self.pool, isbn).await
    }

    async fn find_by_external_id(
        &self,
        kind: ExternalIdKind,
        value: &str,
    ) -> Result<Option<CatalogEntry>> {
        books::find_by_external_id(&self.pool, kind, value).await
    }

    async fn find_by_title_and_author(
        &self,
        title: &str,
        author_id: Uuid,
    ) -> Result<Option<CatalogEntry>> {
        books::find_by_title_and_author(&self.pool, title, author_id).await
    }

    async fn find_duplicate(&self, criteria: &DuplicateCriteria) -> Result<Option<CatalogEntry>> {
        books::find_duplicate(&self.pool, criteria).await
    }

    async fn find_all_by_author(&self, author_id: Uuid) -> Result<Vec<CatalogEntry>> {
        books::find_all_by_author(&self.pool, author_id).await
    }

    async fn apply_sync(
        &self,
        entry_id: Uuid,
        backfill: &IdentifierBackfill,
        isbns: &[String],
    ) -> Result<CatalogEntry> {
        books::apply_sync(&self.pool, entry_id, backfill, isbns).await
    }
}

#[async_trait]
impl AuthorStore for SqliteStore {
    async fn find_by_external_id(&self, open_library_id: &str) -> Result<Option<Author>> {
        authors::load_author_by_open_library_id(&self.pool, open_library_id).await
    }

    async fn find_by_name_case_insensitive(&self, name: &str) -> Result<Option<Author>> {
        authors::load_author_by_name(&self.pool, name).await
    }
}

#[async_trait]
impl GenreStore for SqliteStore {
    async fn find_by_names_case_insensitive(&self, names: &[String]) -> Result<Vec<Genre>> {
        genres::load_genres_by_names(&self.pool, names).await
    }

    async fn create_many(&self, names: &[String]) -> Result<()> {
        let inserted = genres::save_genres(&self.pool, names).await?;
        tracing::debug!(requested = names.len(), inserted = inserted, "Genres created");
        Ok(())
    }
}

/// Key for case-insensitive name and title matching
///
/// Stored alongside the display value (`authors.name_folded`,
/// `books.title_folded`) because SQLite `NOCASE` only folds ASCII.
pub fn fold_case(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Parse a TEXT primary key column
pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid UUID '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_handles_non_ascii() {
        assert_eq!(fold_case("  LEV TOLSTOÏ "), "lev tolstoï");
        assert_eq!(fold_case("ÉTUDES"), fold_case("études"));
        assert_eq!(fold_case("Война и мир"), fold_case("ВОЙНА И МИР"));
    }
}

/// Single-connection in-memory database with the catalog schema
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    readsy_common::db::initialize_schema(&pool)
        .await
        .expect("Schema initialization failed");

    pool
}
