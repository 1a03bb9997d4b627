//! Google Books API client
//!
//! Volumes search by ISBN (`/volumes?q=isbn:{isbn}`); the first item wins.
//! Google provides its own volume id but no stable author key.

use super::{clean_text, first_year, lenient, push_unique, BookSource, SourceError};
use crate::types::{ExternalRecord, SourceKind};
use async_trait::async_trait;
use readsy_common::config::{get_user_agent, SourcesConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct GVolumes {
    #[serde(default, deserialize_with = "lenient::elements")]
    items: Vec<GVolume>,
}

#[derive(Debug, Deserialize)]
struct GVolume {
    #[serde(default, deserialize_with = "lenient::string")]
    id: Option<String>,
    #[serde(rename = "volumeInfo", default)]
    volume_info: GVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GVolumeInfo {
    #[serde(default, deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    authors: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    categories: Vec<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    page_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::string")]
    publisher: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    published_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::elements")]
    industry_identifiers: Vec<GIdentifier>,
}

/// Some entries (type `OTHER`) carry no usable identifier
#[derive(Debug, Deserialize)]
struct GIdentifier {
    #[serde(default, deserialize_with = "lenient::string")]
    identifier: Option<String>,
}

/// Google Books API client
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    /// Create client
    ///
    /// # Arguments
    /// * `base_url` - e.g. `https://www.googleapis.com/books/v1`
    /// * `api_key` - optional; anonymous quota applies without it
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        api_key: Option<String>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Build from config with an already-resolved API key
    pub fn from_config(config: &SourcesConfig, api_key: Option<String>) -> Result<Self, SourceError> {
        Self::new(config.google_books_base_url.clone(), &get_user_agent(), api_key)
    }

    fn volumes_url(&self) -> String {
        format!("{}/volumes", self.base_url)
    }

    fn normalize(isbn: &str, volume: GVolume) -> ExternalRecord {
        let info = volume.volume_info;
        let mut record = ExternalRecord::new(SourceKind::GoogleBooks, isbn);

        record.google_book_id = clean_text(volume.id);
        record.title = clean_text(info.title);
        push_unique(&mut record.authors, info.authors);
        record.description = clean_text(info.description);
        push_unique(&mut record.genre_names, info.categories);
        record.page_count = info.page_count.filter(|&n| n > 0);
        record.publisher = clean_text(info.publisher);
        record.original_publication_year = info.published_date.as_deref().and_then(first_year);
        record.all_isbns.extend(
            info.industry_identifiers
                .into_iter()
                .filter_map(|id| clean_text(id.identifier)),
        );

        record
    }
}

#[async_trait]
impl BookSource for GoogleBooksClient {
    fn kind(&self) -> SourceKind {
        SourceKind::GoogleBooks
    }

    async fn fetch(&self, isbn: &str) -> Result<Option<ExternalRecord>, SourceError> {
        let url = self.volumes_url();
        let query = format!("isbn:{}", isbn);

        debug!(isbn = %isbn, url = %url, "Querying Google Books API");

        let mut request = self.client.get(&url).query(&[("q", query.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request
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

        let volumes: GVolumes = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let Some(volume) = volumes.items.into_iter().next() else {
            return Ok(None);
        };

        let record = Self::normalize(isbn, volume);

        info!(
            isbn = %isbn,
            title = ?record.title,
            author = ?record.authors.first(),
            google_book_id = ?record.google_book_id,
            "Retrieved volume from Google Books"
        );

        Ok(Some(record))
    }
}
