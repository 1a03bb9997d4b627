//! OpenLibrary API client
//!
//! Edition lookup by ISBN (`/isbn/{isbn}.json`) followed by one author
//! lookup per author reference (`/authors/{olid}.json`). Author lookups are
//! independent and run concurrently; a failed author lookup only drops that
//! name.
//!
//! OpenLibrary is the only source with a stable author key, which becomes
//! `author_external_id`.

use super::{clean_text, first_year, lenient, push_unique, BookSource, SourceError};
use crate::types::{ExternalRecord, SourceKind};
use async_trait::async_trait;
use futures::future::join_all;
use governor::{Quota, RateLimiter};
use readsy_common::config::{get_user_agent, SourcesConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info, warn};

/// OpenLibrary edition response (only the fields we normalize)
///
/// Every field decodes leniently: editions are community-edited and a
/// wrong-typed field must not cost the rest of the record.
#[derive(Debug, Deserialize)]
struct OLEdition {
    #[serde(default, deserialize_with = "lenient::string")]
    key: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::elements")]
    authors: Vec<OLKeyRef>,
    #[serde(default, deserialize_with = "lenient::text")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    publishers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    number_of_pages: Option<u32>,
    #[serde(default, deserialize_with = "lenient::strings")]
    isbn_10: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    isbn_13: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    subjects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OLKeyRef {
    #[serde(default, deserialize_with = "lenient::string")]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OLAuthor {
    #[serde(default, deserialize_with = "lenient::string")]
    name: Option<String>,
}

type DirectLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// OpenLibrary API client
pub struct OpenLibraryClient {
    client: Client,
    base_url: String,
    /// Shared by edition and author requests
    rate_limiter: DirectLimiter,
}

impl OpenLibraryClient {
    /// Create client
    ///
    /// # Arguments
    /// * `base_url` - e.g. `https://openlibrary.org` (no trailing slash)
    /// * `user_agent` - identifying agent; OpenLibrary throttles anonymous clients
    /// * `requests_per_second` - request pacing (0 is treated as 1)
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        requests_per_second: u32,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(rps)),
        })
    }

    pub fn from_config(config: &SourcesConfig) -> Result<Self, SourceError> {
        Self::new(
            config.open_library_base_url.clone(),
            &get_user_agent(),
            config.open_library_requests_per_second,
        )
    }

    fn edition_url(&self, isbn: &str) -> String {
        format!("{}/isbn/{}.json", self.base_url, isbn)
    }

    fn author_url(&self, author_key: &str) -> String {
        format!("{}{}.json", self.base_url, author_key)
    }

    /// GET and decode JSON; 404 is a miss, not an error
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, SourceError> {
        self.rate_limiter.until_ready().await;

        debug!(url = %url, "Querying OpenLibrary API");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::Status(status.as_u16(), error_text));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| SourceError::Parse(e.to_string()))
    }

    /// Resolve one author reference to a display name
    async fn author_name(&self, author_key: &str) -> Option<String> {
        match self.get_json::<OLAuthor>(&self.author_url(author_key)).await {
            Ok(Some(author)) => clean_text(author.name),
            Ok(None) => {
                debug!(author_key = %author_key, "OpenLibrary author not found");
                None
            }
            Err(e) => {
                warn!(author_key = %author_key, error = %e, "OpenLibrary author lookup failed");
                None
            }
        }
    }

    fn normalize(&self, isbn: &str, edition: OLEdition, author_names: Vec<String>) -> ExternalRecord {
        let mut record = ExternalRecord::new(SourceKind::OpenLibrary, isbn);

        record.open_library_id = clean_text(edition.key);
        record.author_external_id = edition
            .authors
            .iter()
            .find_map(|a| a.key.as_deref())
            .and_then(bare_key);
        record.title = clean_text(edition.title);
        push_unique(&mut record.authors, author_names);
        record.description = clean_text(edition.description);
        push_unique(&mut record.genre_names, edition.subjects);
        record.page_count = edition.number_of_pages.filter(|&n| n > 0);
        record.publisher = clean_text(edition.publishers.into_iter().next());
        record.original_publication_year = edition.publish_date.as_deref().and_then(first_year);
        record.all_isbns.extend(
            edition
                .isbn_10
                .into_iter()
                .chain(edition.isbn_13)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );

        record
    }
}

#[async_trait]
impl BookSource for OpenLibraryClient {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenLibrary
    }

    async fn fetch(&self, isbn: &str) -> Result<Option<ExternalRecord>, SourceError> {
        let Some(edition) = self.get_json::<OLEdition>(&self.edition_url(isbn)).await? else {
            return Ok(None);
        };

        // Author lookups share no state; fan out and keep reference order
        let keys = edition.authors.iter().filter_map(|a| a.key.as_deref());
        let names = join_all(keys.map(|key| self.author_name(key))).await;
        let author_names: Vec<String> = names.into_iter().flatten().collect();

        let record = self.normalize(isbn, edition, author_names);

        info!(
            isbn = %isbn,
            title = ?record.title,
            author = ?record.authors.first(),
            open_library_id = ?record.open_library_id,
            "Retrieved edition from OpenLibrary"
        );

        Ok(Some(record))
    }
}

/// `/authors/OL26320A` → `OL26320A`
fn bare_key(key: &str) -> Option<String> {
    key.rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
