//! Core types shared by the reconciliation pipeline
//!
//! Data contracts between the stages:
//! - **Source adapters** produce [`ExternalRecord`]
//! - **Merge engine** produces [`CanonicalRecord`]
//! - **Identity resolver** and **catalog sync** read [`CatalogEntry`] rows
//! - The engine returns exactly one [`Outcome`] per call

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Source Records
// ============================================================================

/// External bibliographic source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    OpenLibrary,
    GoogleBooks,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenLibrary => "open_library",
            Self::GoogleBooks => "google_books",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's normalized answer for an ISBN
///
/// Invariant: `all_isbns` contains the queried ISBN. Empty strings coming
/// from a source are stored as `None`, never as `Some("")`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRecord {
    /// Adapter that produced this record; decides identifier authority in merge
    pub source: SourceKind,
    pub google_book_id: Option<String>,
    pub open_library_id: Option<String>,
    /// Stable author key (bare OpenLibrary OLID); Google never provides one
    pub author_external_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
    /// Ordered, de-duplicated
    pub genre_names: Vec<String>,
    pub page_count: Option<u32>,
    pub publisher: Option<String>,
    pub original_publication_year: Option<i32>,
    pub all_isbns: BTreeSet<String>,
}

impl ExternalRecord {
    /// Empty record for `source` that already satisfies the ISBN invariant
    pub fn new(source: SourceKind, queried_isbn: &str) -> Self {
        let mut all_isbns = BTreeSet::new();
        all_isbns.insert(queried_isbn.to_string());

        Self {
            source,
            google_book_id: None,
            open_library_id: None,
            author_external_id: None,
            title: None,
            authors: Vec::new(),
            description: None,
            genre_names: Vec::new(),
            page_count: None,
            publisher: None,
            original_publication_year: None,
            all_isbns,
        }
    }
}

/// Merged description of one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub google_book_id: Option<String>,
    pub open_library_id: Option<String>,
    pub author_external_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub genre_names: Vec<String>,
    pub page_count: Option<u32>,
    pub publisher: Option<String>,
    pub original_publication_year: Option<i32>,
    pub all_isbns: BTreeSet<String>,
    /// Local author key, filled by the identity resolver
    pub resolved_author_id: Option<Uuid>,
}

// ============================================================================
// Catalog Rows
// ============================================================================

/// Existing book row in the local catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: Uuid,
    pub title: String,
    pub author_id: Option<Uuid>,
    pub google_book_id: Option<String>,
    pub open_library_id: Option<String>,
    pub isbns: BTreeSet<String>,
}

/// Local author row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub open_library_id: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, open_library_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            open_library_id,
        }
    }
}

/// Shared genre row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

/// Identifier namespace owned by one external source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalIdKind {
    GoogleBooks,
    OpenLibrary,
}

impl ExternalIdKind {
    /// Catalog column holding identifiers of this kind
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::GoogleBooks => "google_book_id",
            Self::OpenLibrary => "open_library_id",
        }
    }
}

/// Criteria for the exact-duplicate query
///
/// Each present key contributes one OR clause; the title clause needs both
/// `title` and `author_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateCriteria {
    pub google_book_id: Option<String>,
    pub open_library_id: Option<String>,
    pub title: Option<String>,
    pub author_id: Option<Uuid>,
}

impl DuplicateCriteria {
    pub fn from_canonical(canonical: &CanonicalRecord) -> Self {
        Self {
            google_book_id: canonical.google_book_id.clone(),
            open_library_id: canonical.open_library_id.clone(),
            title: canonical.title.clone(),
            author_id: canonical.resolved_author_id,
        }
    }

    pub fn has_title_clause(&self) -> bool {
        self.title.is_some() && self.author_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.google_book_id.is_none() && self.open_library_id.is_none() && !self.has_title_clause()
    }
}

/// Identifier values to write onto a catalog entry whose field is still null
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierBackfill {
    pub google_book_id: Option<String>,
    pub open_library_id: Option<String>,
}

impl IdentifierBackfill {
    pub fn is_empty(&self) -> bool {
        self.google_book_id.is_none() && self.open_library_id.is_none()
    }
}

// ============================================================================
// Engine Result
// ============================================================================

/// Result of one reconciliation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// ISBN already catalogued; no external source was consulted
    AlreadyExists { entry: CatalogEntry },
    /// Exact duplicate found and synced with the new identifiers/ISBNs
    LinkedToExisting { entry: CatalogEntry },
    /// Same author, no exact match; needs a human decision
    PossibleTranslation {
        canonical: CanonicalRecord,
        candidates: Vec<CatalogEntry>,
    },
    /// Nothing local matches; ready for manual confirmation or creation
    NewBookFound { canonical: CanonicalRecord },
    /// Neither source knows this ISBN
    #[serde(rename = "BOOK_NOT_FOUND_EXTERNAL")]
    NotFoundExternally {},
}

impl Outcome {
    /// Status label, as serialized
    pub fn status(&self) -> &'static str {
        match self {
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::LinkedToExisting { .. } => "LINKED_TO_EXISTING",
            Self::PossibleTranslation { .. } => "POSSIBLE_TRANSLATION",
            Self::NewBookFound { .. } => "NEW_BOOK_FOUND",
            Self::NotFoundExternally {} => "BOOK_NOT_FOUND_EXTERNAL",
        }
    }
}
