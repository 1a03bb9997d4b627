//! Book (catalog entry) database operations

use super::{fold_case, parse_uuid};
use crate::types::{CanonicalRecord, CatalogEntry, DuplicateCriteria, ExternalIdKind, IdentifierBackfill};
use readsy_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

const SELECT_ENTRY: &str =
    "SELECT id, title, author_id, google_book_id, open_library_id FROM books";

/// Book to be inserted into the catalog
#[derive(Debug, Clone)]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub author_id: Option<Uuid>,
    pub google_book_id: Option<String>,
    pub open_library_id: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub publisher: Option<String>,
    pub original_publication_year: Option<i32>,
    pub isbns: BTreeSet<String>,
    /// Genre names to link; each must already exist in `genres`
    pub genre_names: Vec<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author_id: None,
            google_book_id: None,
            open_library_id: None,
            description: None,
            page_count: None,
            publisher: None,
            original_publication_year: None,
            isbns: BTreeSet::new(),
            genre_names: Vec::new(),
        }
    }

    /// Book confirmed from a reconciled record
    ///
    /// Reconciliation has already get-or-created the genres, so the stored
    /// names in `genre_names` link directly.
    pub fn from_canonical(canonical: &CanonicalRecord) -> Self {
        Self {
            author_id: canonical.resolved_author_id,
            google_book_id: canonical.google_book_id.clone(),
            open_library_id: canonical.open_library_id.clone(),
            description: canonical.description.clone(),
            page_count: canonical.page_count,
            publisher: canonical.publisher.clone(),
            original_publication_year: canonical.original_publication_year,
            isbns: canonical.all_isbns.clone(),
            genre_names: canonical.genre_names.clone(),
            ..Self::new(canonical.title.clone().unwrap_or_default())
        }
    }
}

/// Insert a book with its ISBNs and genre links
///
/// ISBNs already owned by another book are skipped, as are genre names with
/// no row in `genres`.
pub async fn save_book(pool: &SqlitePool, book: &NewBook) -> Result<CatalogEntry> {
    if book.title.trim().is_empty() {
        return Err(Error::InvalidInput("Book title must not be empty".to_string()));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO books (
            id, title, title_folded, author_id, google_book_id, open_library_id, description,
            page_count, publisher, original_publication_year, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(book.id.to_string())
    .bind(book.title.trim())
    .bind(fold_case(&book.title))
    .bind(book.author_id.map(|id| id.to_string()))
    .bind(&book.google_book_id)
    .bind(&book.open_library_id)
    .bind(&book.description)
    .bind(book.page_count.map(i64::from))
    .bind(&book.publisher)
    .bind(book.original_publication_year)
    .execute(&mut *tx)
    .await?;

    for isbn in &book.isbns {
        sqlx::query(
            "INSERT INTO book_isbns (isbn, book_id, created_at) VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(isbn) DO NOTHING",
        )
        .bind(isbn)
        .bind(book.id.to_string())
        .execute(&mut *tx)
        .await?;
    }

    for genre_name in &book.genre_names {
        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) \
             SELECT ?, id FROM genres WHERE name = ? COLLATE NOCASE \
             ON CONFLICT DO NOTHING",
        )
        .bind(book.id.to_string())
        .bind(genre_name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!(book_id = %book.id, title = %book.title, isbns = book.isbns.len(), "Saved book");

    require_entry(pool, book.id).await
}

/// Load one entry by id
pub async fn load_entry(pool: &SqlitePool, id: Uuid) -> Result<Option<CatalogEntry>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ENTRY))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => with_isbns(pool, entry_from_row(&row)?).await.map(Some),
        None => Ok(None),
    }
}

async fn require_entry(pool: &SqlitePool, id: Uuid) -> Result<CatalogEntry> {
    load_entry(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Book {}", id)))
}

/// Entry owning `isbn`
pub async fn find_by_isbn(pool: &SqlitePool, isbn: &str) -> Result<Option<CatalogEntry>> {
    let row = sqlx::query(
        r#"
        SELECT b.id, b.title, b.author_id, b.google_book_id, b.open_library_id
        FROM books b
        JOIN book_isbns i ON i.book_id = b.id
        WHERE i.isbn = ?
        "#,
    )
    .bind(isbn)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => with_isbns(pool, entry_from_row(&row)?).await.map(Some),
        None => Ok(None),
    }
}

pub async fn find_by_external_id(
    pool: &SqlitePool,
    kind: ExternalIdKind,
    value: &str,
) -> Result<Option<CatalogEntry>> {
    let sql = format!("{} WHERE {} = ? ORDER BY rowid LIMIT 1", SELECT_ENTRY, kind.column());
    let row = sqlx::query(&sql).bind(value).fetch_optional(pool).await?;

    match row {
        Some(row) => with_isbns(pool, entry_from_row(&row)?).await.map(Some),
        None => Ok(None),
    }
}

pub async fn find_by_title_and_author(
    pool: &SqlitePool,
    title: &str,
    author_id: Uuid,
) -> Result<Option<CatalogEntry>> {
    let sql = format!(
        "{} WHERE title_folded = ? AND author_id = ? ORDER BY rowid LIMIT 1",
        SELECT_ENTRY
    );
    let row = sqlx::query(&sql)
        .bind(fold_case(title))
        .bind(author_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => with_isbns(pool, entry_from_row(&row)?).await.map(Some),
        None => Ok(None),
    }
}

/// First entry matching any clause of `criteria`, in insertion order
///
/// Clauses: `google_book_id =` OR `open_library_id =` OR
/// (`title` equal ignoring case AND `author_id =`). Absent values drop
/// their clause; no clause at all means no match.
pub async fn find_duplicate(
    pool: &SqlitePool,
    criteria: &DuplicateCriteria,
) -> Result<Option<CatalogEntry>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(google_book_id) = &criteria.google_book_id {
        clauses.push("google_book_id = ?");
        binds.push(google_book_id.clone());
    }
    if let Some(open_library_id) = &criteria.open_library_id {
        clauses.push("open_library_id = ?");
        binds.push(open_library_id.clone());
    }
    if let (Some(title), Some(author_id)) = (&criteria.title, criteria.author_id) {
        clauses.push("(title_folded = ? AND author_id = ?)");
        binds.push(fold_case(title));
        binds.push(author_id.to_string());
    }

    if clauses.is_empty() {
        return Ok(None);
    }

    let sql = format!(
        "{} WHERE {} ORDER BY rowid LIMIT 1",
        SELECT_ENTRY,
        clauses.join(" OR ")
    );

    let mut query = sqlx::query(&sql);
    for value in &binds {
        query = query.bind(value.as_str());
    }

    match query.fetch_optional(pool).await? {
        Some(row) => with_isbns(pool, entry_from_row(&row)?).await.map(Some),
        None => Ok(None),
    }
}

pub async fn find_all_by_author(pool: &SqlitePool, author_id: Uuid) -> Result<Vec<CatalogEntry>> {
    let rows = sqlx::query(&format!("{} WHERE author_id = ? ORDER BY rowid", SELECT_ENTRY))
        .bind(author_id.to_string())
        .fetch_all(pool)
        .await?;

    let bare = rows.iter().map(entry_from_row).collect::<Result<Vec<_>>>()?;
    drop(rows);

    let mut entries = Vec::with_capacity(bare.len());
    for entry in bare {
        entries.push(with_isbns(pool, entry).await?);
    }
    Ok(entries)
}

/// Backfill null identifiers and append ISBNs in one transaction
///
/// An identifier already held by a different book is not copied (the
/// columns are UNIQUE); ISBNs owned elsewhere are skipped. With nothing to
/// write the entry is re-read without opening a transaction.
pub async fn apply_sync(
    pool: &SqlitePool,
    entry_id: Uuid,
    backfill: &IdentifierBackfill,
    isbns: &[String],
) -> Result<CatalogEntry> {
    if backfill.is_empty() && isbns.is_empty() {
        return require_entry(pool, entry_id).await;
    }

    let mut tx = pool.begin().await?;
    let id = entry_id.to_string();

    for (kind, value) in [
        (ExternalIdKind::GoogleBooks, &backfill.google_book_id),
        (ExternalIdKind::OpenLibrary, &backfill.open_library_id),
    ] {
        let Some(value) = value else { continue };
        let column = kind.column();
        let sql = format!(
            "UPDATE books SET {col} = COALESCE({col}, ?), updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND {col} IS NULL \
             AND NOT EXISTS (SELECT 1 FROM books WHERE {col} = ?)",
            col = column
        );
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(&id)
            .bind(value)
            .execute(&mut *tx)
            .await?;

        debug!(
            book_id = %entry_id,
            column = column,
            value = %value,
            updated = result.rows_affected() > 0,
            "Identifier backfill"
        );
    }

    let mut appended = 0u64;
    for isbn in isbns {
        let result = sqlx::query(
            "INSERT INTO book_isbns (isbn, book_id, created_at) VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(isbn) DO NOTHING",
        )
        .bind(isbn)
        .bind(&id)
        .execute(&mut *tx)
        .await?;
        appended += result.rows_affected();
    }

    tx.commit().await?;

    debug!(
        book_id = %entry_id,
        requested = isbns.len(),
        appended = appended,
        "Catalog sync committed"
    );

    require_entry(pool, entry_id).await
}

/// Fill `isbns` of an entry read without them
async fn with_isbns(pool: &SqlitePool, mut entry: CatalogEntry) -> Result<CatalogEntry> {
    let isbns: Vec<String> = sqlx::query_scalar("SELECT isbn FROM book_isbns WHERE book_id = ?")
        .bind(entry.id.to_string())
        .fetch_all(pool)
        .await?;

    entry.isbns = isbns.into_iter().collect();
    Ok(entry)
}

/// Book columns only; `isbns` is left empty
fn entry_from_row(row: &SqliteRow) -> Result<CatalogEntry> {
    let id_str: String = row.get("id");
    let author_id: Option<String> = row.get("author_id");

    Ok(CatalogEntry {
        id: parse_uuid(&id_str)?,
        title: row.get("title"),
        author_id: author_id.as_deref().map(parse_uuid).transpose()?,
        google_book_id: row.get("google_book_id"),
        open_library_id: row.get("open_library_id"),
        isbns: BTreeSet::new(),
    })
}
