//! Merge engine
//!
//! Combines up to two source records into one [`CanonicalRecord`].
//!
//! # Precedence
//! The OpenLibrary record is the base when present, Google the other.
//! Every field is fill-if-missing from the other record, except:
//! - **description**: the other's wins when the base one is absent or
//!   shorter than [`SHORT_DESCRIPTION_CHARS`]
//! - **genre_names**: union in first-seen order, then tag normalization
//! - **all_isbns**: set union
//! - **google_book_id / open_library_id**: taken from the record whose
//!   `source` owns that identifier, regardless of base/other position

use crate::services::genre_normalizer::normalize_tags;
use crate::types::{CanonicalRecord, ExternalRecord, SourceKind};
use tracing::debug;

/// Descriptions shorter than this are treated as placeholders
pub const SHORT_DESCRIPTION_CHARS: usize = 50;

/// Merge the OpenLibrary and Google records for one ISBN
///
/// Returns `None` only when both are `None`.
pub fn merge(
    open_library: Option<ExternalRecord>,
    google: Option<ExternalRecord>,
) -> Option<CanonicalRecord> {
    let (base, other) = match (open_library, google) {
        (Some(base), other) => (base, other),
        (None, Some(google)) => (google, None),
        (None, None) => return None,
    };

    let Some(other) = other else {
        return Some(normalize(base));
    };

    let google_book_id = authoritative(&base, &other, SourceKind::GoogleBooks, |r| {
        r.google_book_id.as_ref()
    });
    let open_library_id = authoritative(&base, &other, SourceKind::OpenLibrary, |r| {
        r.open_library_id.as_ref()
    });

    let description = match base.description {
        Some(d) if d.chars().count() >= SHORT_DESCRIPTION_CHARS => Some(d),
        short => other.description.or(short),
    };

    let genre_names = normalize_tags(
        &base
            .genre_names
            .iter()
            .chain(other.genre_names.iter())
            .collect::<Vec<_>>(),
    );

    let mut all_isbns = base.all_isbns;
    all_isbns.extend(other.all_isbns);

    let authors = if base.authors.is_empty() {
        other.authors
    } else {
        base.authors
    };

    let merged = CanonicalRecord {
        google_book_id,
        open_library_id,
        author_external_id: base.author_external_id.or(other.author_external_id),
        title: base.title.or(other.title),
        authors,
        description,
        genre_names,
        page_count: base.page_count.or(other.page_count),
        publisher: base.publisher.or(other.publisher),
        original_publication_year: base
            .original_publication_year
            .or(other.original_publication_year),
        all_isbns,
        resolved_author_id: None,
    };

    debug!(
        title = ?merged.title,
        google_book_id = ?merged.google_book_id,
        open_library_id = ?merged.open_library_id,
        isbn_count = merged.all_isbns.len(),
        genre_count = merged.genre_names.len(),
        "Merged source records"
    );

    Some(merged)
}

/// Single-source canonical record (genre tags normalized)
pub fn normalize(record: ExternalRecord) -> CanonicalRecord {
    CanonicalRecord {
        google_book_id: record.google_book_id,
        open_library_id: record.open_library_id,
        author_external_id: record.author_external_id,
        title: record.title,
        authors: record.authors,
        description: record.description,
        genre_names: normalize_tags(&record.genre_names),
        page_count: record.page_count,
        publisher: record.publisher,
        original_publication_year: record.original_publication_year,
        all_isbns: record.all_isbns,
        resolved_author_id: None,
    }
}

/// Identifier from the record whose source owns it, else whichever has one
fn authoritative<F>(
    base: &ExternalRecord,
    other: &ExternalRecord,
    owner: SourceKind,
    field: F,
) -> Option<String>
where
    F: Fn(&ExternalRecord) -> Option<&String>,
{
    let (owning, rest) = if other.source == owner && base.source != owner {
        (other, base)
    } else {
        (base, other)
    };

    field(owning).or_else(|| field(rest)).cloned()
}
