//! Identity Resolver
//!
//! Places a merged record relative to the local catalog.
//!
//! # Steps
//! 1. **Author**: by bare OpenLibrary key when the record has one, then by
//!    case-insensitive exact match on the first author name
//! 2. **Exact duplicate**: first catalog entry sharing the Google id, the
//!    OpenLibrary id, or (title ignoring case AND resolved author)
//! 3. **Translation heuristic**: with a resolved author and no duplicate,
//!    every entry by that author is a candidate for human review
//!
//! Multiple rows satisfying step 2 are not ranked; the store returns the
//! first in insertion order.

use crate::store::{AuthorStore, CatalogStore};
use crate::types::{CanonicalRecord, CatalogEntry, DuplicateCriteria};
use readsy_common::Result;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Where a canonical record sits relative to the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exact duplicate; caller syncs identifiers and ISBNs onto it
    Duplicate(CatalogEntry),
    /// Other books by the same author (never empty)
    Candidates(Vec<CatalogEntry>),
    /// Nothing local relates to this record
    New,
}

pub struct IdentityResolver {
    catalog: Arc<dyn CatalogStore>,
    authors: Arc<dyn AuthorStore>,
}

impl IdentityResolver {
    pub fn new(catalog: Arc<dyn CatalogStore>, authors: Arc<dyn AuthorStore>) -> Self {
        Self { catalog, authors }
    }

    /// Local author id for the record, if any
    pub async fn resolve_author(&self, canonical: &CanonicalRecord) -> Result<Option<Uuid>> {
        if let Some(key) = &canonical.author_external_id {
            if let Some(author) = self.authors.find_by_external_id(key).await? {
                debug!(author_key = %key, author_id = %author.id, "Author resolved by key");
                return Ok(Some(author.id));
            }
        }

        let Some(name) = canonical.authors.first() else {
            return Ok(None);
        };

        let author = self.authors.find_by_name_case_insensitive(name).await?;
        if let Some(author) = &author {
            debug!(author = %name, author_id = %author.id, "Author resolved by name");
        }
        Ok(author.map(|a| a.id))
    }

    /// Classify the record, filling `resolved_author_id` on the way
    pub async fn resolve(&self, canonical: &mut CanonicalRecord) -> Result<Resolution> {
        canonical.resolved_author_id = self.resolve_author(canonical).await?;

        let criteria = DuplicateCriteria::from_canonical(canonical);
        if let Some(entry) = self.catalog.find_duplicate(&criteria).await? {
            info!(
                book_id = %entry.id,
                title = %entry.title,
                "Exact duplicate found in catalog"
            );
            return Ok(Resolution::Duplicate(entry));
        }

        let Some(author_id) = canonical.resolved_author_id else {
            return Ok(Resolution::New);
        };

        let candidates = self.catalog.find_all_by_author(author_id).await?;
        if candidates.is_empty() {
            Ok(Resolution::New)
        } else {
            info!(
                author_id = %author_id,
                candidates = candidates.len(),
                "Known author, no exact match: possible translation"
            );
            Ok(Resolution::Candidates(candidates))
        }
    }
}
