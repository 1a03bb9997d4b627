//! Author database operations

use super::{fold_case, parse_uuid};
use crate::types::Author;
use readsy_common::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Save author (upsert by id)
pub async fn save_author(pool: &SqlitePool, author: &Author) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO authors (id, name, name_folded, open_library_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            name_folded = excluded.name_folded,
            open_library_id = COALESCE(authors.open_library_id, excluded.open_library_id),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(author.id.to_string())
    .bind(&author.name)
    .bind(fold_case(&author.name))
    .bind(&author.open_library_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load author by bare OpenLibrary key (e.g. `OL26320A`)
pub async fn load_author_by_open_library_id(
    pool: &SqlitePool,
    open_library_id: &str,
) -> Result<Option<Author>> {
    let row = sqlx::query("SELECT id, name, open_library_id FROM authors WHERE open_library_id = ?")
        .bind(open_library_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(author_from_row).transpose()
}

/// Load the first-inserted author whose name matches ignoring case
///
/// Folding is Unicode-aware (`Tolstoï` matches `TOLSTOÏ`).
pub async fn load_author_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Author>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, open_library_id
        FROM authors
        WHERE name_folded = ?
        ORDER BY rowid
        LIMIT 1
        "#,
    )
    .bind(fold_case(name))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(author_from_row).transpose()
}

fn author_from_row(row: &SqliteRow) -> Result<Author> {
    let id_str: String = row.get("id");

    Ok(Author {
        id: parse_uuid(&id_str)?,
        name: row.get("name"),
        open_library_id: row.get("open_library_id"),
    })
}
