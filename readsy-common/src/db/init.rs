//! Database initialization
//!
//! Opens (or creates) the catalog database and makes sure every table the
//! reconciliation engine reads or writes exists. Safe to call on every
//! startup: all statements are `CREATE ... IF NOT EXISTS`.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL lets concurrent reconcile calls read while one writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Create all catalog tables on an already-open pool
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    create_authors_table(pool).await?;
    create_books_table(pool).await?;
    create_book_isbns_table(pool).await?;
    create_genres_table(pool).await?;
    create_book_genres_table(pool).await?;

    info!("Catalog schema initialized (authors, books, book_isbns, genres, book_genres)");
    Ok(())
}

/// Create the authors table
///
/// `open_library_id` holds the bare OpenLibrary author key (e.g. `OL26320A`).
/// `name_folded` is the trimmed, Unicode-lowercased name used for
/// case-insensitive lookups (SQLite `NOCASE` only folds ASCII).
pub async fn create_authors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL,
            open_library_id TEXT UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_authors_name_folded ON authors(name_folded)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the books table
///
/// `title_folded` mirrors `title` lowercased, like `authors.name_folded`.
pub async fn create_books_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            title_folded TEXT NOT NULL,
            author_id TEXT REFERENCES authors(id) ON DELETE SET NULL,
            google_book_id TEXT UNIQUE,
            open_library_id TEXT UNIQUE,
            description TEXT,
            page_count INTEGER,
            publisher TEXT,
            original_publication_year INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_author_title ON books(author_id, title_folded)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the book_isbns table
///
/// An ISBN belongs to at most one catalog entry.
pub async fn create_book_isbns_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_isbns (
            isbn TEXT PRIMARY KEY,
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_book_isbns_book ON book_isbns(book_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the genres table
///
/// Uniqueness is case-insensitive so concurrent get-or-create callers
/// converge on one row per name.
pub async fn create_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_book_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_genres (
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            genre_id TEXT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
            PRIMARY KEY (book_id, genre_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
