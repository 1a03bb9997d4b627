//! Genre database operations
//!
//! `genres.name` is `UNIQUE COLLATE NOCASE`, so both the lookup and the
//! duplicate guard on insert ignore ASCII case.

use super::parse_uuid;
use crate::types::Genre;
use readsy_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Genres whose names match any of `names`, ignoring case
pub async fn load_genres_by_names(pool: &SqlitePool, names: &[String]) -> Result<Vec<Genre>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "SELECT id, name FROM genres WHERE name IN ({}) ORDER BY rowid",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for name in names {
        query = query.bind(name.as_str());
    }

    let rows = query.fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            let id_str: String = row.get("id");
            Ok(Genre {
                id: parse_uuid(&id_str)?,
                name: row.get("name"),
            })
        })
        .collect()
}

/// Insert genres in one transaction; existing names are left untouched
///
/// Returns the number of rows actually inserted.
pub async fn save_genres(pool: &SqlitePool, names: &[String]) -> Result<u64> {
    if names.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for name in names {
        let result = sqlx::query(
            "INSERT INTO genres (id, name, created_at) VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}
