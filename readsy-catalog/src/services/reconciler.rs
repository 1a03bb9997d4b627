//! ISBN reconciliation entry point
//!
//! # Flow
//! 1. Clean the ISBN (drop `-` and spaces); empty input is rejected
//! 2. Catalog lookup by ISBN → `AlreadyExists`, no external call made
//! 3. OpenLibrary and Google Books queried concurrently, each with its own
//!    time budget; failures count as "no record"
//! 4. Merge → `NotFoundExternally` when neither source knows the ISBN
//! 5. Genre get-or-create; canonical genre names become the stored names
//! 6. Identity resolution → `LinkedToExisting` (after sync),
//!    `PossibleTranslation` or `NewBookFound`
//!
//! A [`Reconciler`] only holds shared read-only handles, so one instance
//! serves any number of concurrent calls.

use crate::config::{resolve_google_api_key, source_timeout};
use crate::db::SqliteStore;
use crate::fusion::{merge, IdentityResolver, Resolution};
use crate::services::catalog_sync;
use crate::services::genre_normalizer::GenreNormalizer;
use crate::sources::{lookup_both, BookSource, GoogleBooksClient, OpenLibraryClient};
use crate::store::{AuthorStore, CatalogStore, GenreStore};
use crate::types::Outcome;
use readsy_common::config::SourcesConfig;
use readsy_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Reconciles ISBNs against the external sources and the local catalog
#[derive(Clone)]
pub struct Reconciler {
    open_library: Arc<dyn BookSource>,
    google: Arc<dyn BookSource>,
    catalog: Arc<dyn CatalogStore>,
    resolver: Arc<IdentityResolver>,
    genres: GenreNormalizer,
    source_timeout: Duration,
}

impl Reconciler {
    pub fn new(
        open_library: Arc<dyn BookSource>,
        google: Arc<dyn BookSource>,
        catalog: Arc<dyn CatalogStore>,
        authors: Arc<dyn AuthorStore>,
        genres: Arc<dyn GenreStore>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            open_library,
            google,
            resolver: Arc::new(IdentityResolver::new(catalog.clone(), authors)),
            catalog,
            genres: GenreNormalizer::new(genres),
            source_timeout,
        }
    }

    /// Production wiring: HTTP source clients plus SQLite stores on `pool`
    pub fn from_pool(pool: SqlitePool, sources: &SourcesConfig) -> Result<Self> {
        let open_library = OpenLibraryClient::from_config(sources)
            .map_err(|e| Error::Config(format!("OpenLibrary client: {}", e)))?;
        let google = GoogleBooksClient::from_config(sources, resolve_google_api_key(sources))
            .map_err(|e| Error::Config(format!("Google Books client: {}", e)))?;

        let store = Arc::new(SqliteStore::new(pool));

        Ok(Self::new(
            Arc::new(open_library),
            Arc::new(google),
            store.clone(),
            store.clone(),
            store,
            source_timeout(sources),
        ))
    }

    /// Reconcile one ISBN
    ///
    /// # Errors
    /// - `InvalidInput` when the ISBN is empty after cleaning
    /// - `Database` when the local store fails (source failures never error)
    pub async fn reconcile(&self, isbn: &str) -> Result<Outcome> {
        let isbn = clean_isbn(isbn);
        if isbn.is_empty() {
            return Err(Error::InvalidInput("ISBN must not be empty".to_string()));
        }

        if let Some(entry) = self.catalog.find_by_isbn(&isbn).await? {
            info!(isbn = %isbn, book_id = %entry.id, "ISBN already in catalog");
            return Ok(Outcome::AlreadyExists { entry });
        }

        let (open_library, google) = lookup_both(
            self.open_library.as_ref(),
            self.google.as_ref(),
            &isbn,
            self.source_timeout,
        )
        .await;

        debug!(
            isbn = %isbn,
            open_library = open_library.is_some(),
            google = google.is_some(),
            "Source lookups settled"
        );

        let Some(mut canonical) = merge(open_library, google) else {
            info!(isbn = %isbn, "ISBN unknown to every source");
            return Ok(Outcome::NotFoundExternally {});
        };

        if !canonical.genre_names.is_empty() {
            let stored = self.genres.get_or_create(&canonical.genre_names).await?;
            canonical.genre_names = stored.into_iter().map(|g| g.name).collect();
        }

        let outcome = match self.resolver.resolve(&mut canonical).await? {
            Resolution::Duplicate(entry) => {
                let entry = catalog_sync::sync(&entry, &canonical, self.catalog.as_ref()).await?;
                Outcome::LinkedToExisting { entry }
            }
            Resolution::Candidates(candidates) => Outcome::PossibleTranslation {
                canonical,
                candidates,
            },
            Resolution::New => Outcome::NewBookFound { canonical },
        };

        info!(isbn = %isbn, status = outcome.status(), "Reconciliation complete");
        Ok(outcome)
    }
}

/// Strip `-` and spaces from a user-supplied ISBN
pub fn clean_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect()
}
