//! Integration tests for concurrent reconciliation
//!
//! Concurrent calls share one `Reconciler` and one on-disk catalog; nothing
//! unpersisted may leak between them, and overlapping genre inserts must
//! converge on one row per name.

mod helpers;

use helpers::{create_test_db, reconciler, sapiens_google, sapiens_open_library, CountingSource, SAPIENS_ISBN};
use readsy_catalog::db::SqliteStore;
use readsy_catalog::services::GenreNormalizer;
use readsy_catalog::{Outcome, SourceKind};
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unpersisted_isbn_both_new() {
    let (_dir, pool) = create_test_db().await;
    let ol = CountingSource::returning(SourceKind::OpenLibrary, Some(sapiens_open_library()));
    let google = CountingSource::returning(SourceKind::GoogleBooks, Some(sapiens_google()));
    let reconciler = reconciler(pool, ol.clone(), google.clone());

    let first = reconciler.clone();
    let second = reconciler.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.reconcile(SAPIENS_ISBN).await }),
        tokio::spawn(async move { second.reconcile(SAPIENS_ISBN).await }),
    );

    let a = a.expect("Task panicked").expect("Reconcile failed");
    let b = b.expect("Task panicked").expect("Reconcile failed");

    assert_eq!(a.status(), "NEW_BOOK_FOUND");
    assert_eq!(b.status(), "NEW_BOOK_FOUND");
    assert_eq!(a, b);

    assert_eq!(ol.calls(), 2);
    assert_eq!(google.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_genre_creation_converges() {
    let (_dir, pool) = create_test_db().await;
    let normalizer = GenreNormalizer::new(Arc::new(SqliteStore::new(pool.clone())));

    let inputs: Vec<Vec<&'static str>> = vec![
        vec!["Sci-Fi", "History"],
        vec!["sci-fi", "Fantasy"],
        vec!["SCI-FI", "history / fantasy"],
        vec!["Fantasy", "Sci-Fi", "Poetry"],
    ];

    let mut join_set = JoinSet::new();
    for round in 0..3 {
        for names in inputs.clone() {
            let normalizer = normalizer.clone();
            join_set.spawn(async move {
                let genres = normalizer
                    .get_or_create(&names)
                    .await
                    .unwrap_or_else(|e| panic!("Round {} failed: {}", round, e));
                assert!(!genres.is_empty());
                genres
            });
        }
    }

    while let Some(result) = join_set.join_next().await {
        result.expect("Task panicked");
    }

    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM genres ORDER BY name")
        .fetch_all(&pool)
        .await
        .unwrap();
    let names: Vec<String> = rows.into_iter().map(|(name,)| name).collect();

    assert_eq!(names, vec!["Fantasy", "History", "Poetry", "Sci-fi"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_isbns_independent() {
    let (_dir, pool) = create_test_db().await;
    let ol = CountingSource::returning(SourceKind::OpenLibrary, Some(sapiens_open_library()));
    let google = CountingSource::failing(SourceKind::GoogleBooks);
    let reconciler = reconciler(pool, ol, google);

    let isbns = ["9780143127796", "9780062316097", "9780771038501"];
    let mut join_set = JoinSet::new();
    for isbn in isbns {
        let reconciler = reconciler.clone();
        join_set.spawn(async move { (isbn, reconciler.reconcile(isbn).await) });
    }

    while let Some(result) = join_set.join_next().await {
        let (isbn, outcome) = result.expect("Task panicked");
        match outcome.expect("Reconcile failed") {
            Outcome::NewBookFound { canonical } => {
                assert!(canonical.all_isbns.contains(isbn));
            }
            other => panic!("Unexpected outcome for {}: {:?}", isbn, other),
        }
    }
}
