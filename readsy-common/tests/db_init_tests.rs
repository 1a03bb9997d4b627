//! Unit tests for database initialization

use readsy_common::db::init::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("readsy.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("readsy.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_catalog_tables_created() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("readsy.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(
        tables,
        vec!["authors", "book_genres", "book_isbns", "books", "genres"]
    );
}

#[tokio::test]
async fn test_genre_names_unique_case_insensitively() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("readsy.db")).await.unwrap();

    sqlx::query("INSERT INTO genres (id, name) VALUES ('g1', 'History')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query("INSERT INTO genres (id, name) VALUES ('g2', 'HISTORY')")
        .execute(&pool)
        .await;

    assert!(duplicate.is_err(), "case-variant genre insert should violate UNIQUE");
}
