//! Genre tag normalization and get-or-create
//!
//! Sources deliver genres as free text ("Fiction / Science Fiction",
//! "History, Modern", "sCi-fI"). [`normalize_tags`] turns those into
//! canonical tag names; [`GenreNormalizer::get_or_create`] resolves them to
//! rows of the shared genre table, inserting only what is missing.

use crate::store::GenreStore;
use crate::types::Genre;
use readsy_common::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Longest stored tag, in characters
pub const MAX_TAG_LEN: usize = 30;

/// Shortest kept tag, in characters
pub const MIN_TAG_LEN: usize = 3;

const SEPARATORS: &[char] = &['/', ':', ','];

/// A dash only separates tags when surrounded by spaces ("History - Modern");
/// "Sci-Fi" stays one tag.
const SPACED_DASH: &str = " - ";

/// Split, canonicalize and de-duplicate free-text genre tags
///
/// First-seen order is kept. Idempotent: normalizing an already normalized
/// list returns it unchanged.
pub fn normalize_tags<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for name in names {
        for part in name.as_ref().split(SPACED_DASH).flat_map(|p| p.split(SEPARATORS)) {
            let Some(tag) = canonical_tag(part) else {
                continue;
            };
            if seen.insert(tag.to_ascii_lowercase()) {
                tags.push(tag);
            }
        }
    }

    tags
}

/// `"  sCi-fI  "` → `"Sci-fi"`; `None` when the result is too short
fn canonical_tag(raw: &str) -> Option<String> {
    let title_cased = raw
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ");

    let truncated: String = title_cased.chars().take(MAX_TAG_LEN).collect();
    let tag = truncated.trim_end().to_string();

    (tag.chars().count() >= MIN_TAG_LEN).then_some(tag)
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Resolves tag names to shared genre rows
#[derive(Clone)]
pub struct GenreNormalizer {
    store: Arc<dyn GenreStore>,
}

impl GenreNormalizer {
    pub fn new(store: Arc<dyn GenreStore>) -> Self {
        Self { store }
    }

    /// Normalize `names` and return one stored genre per tag, in tag order
    ///
    /// Missing names are inserted with a duplicate-safe insert, then every
    /// requested row is re-fetched, so concurrent callers with overlapping
    /// names converge on the same rows. The returned names are the stored
    /// spellings, which may differ in case from the input.
    pub async fn get_or_create<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Genre>> {
        let tags = normalize_tags(names);
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.store.find_by_names_case_insensitive(&tags).await?;
        let known: HashSet<String> = existing
            .iter()
            .map(|g| g.name.to_ascii_lowercase())
            .collect();

        let missing: Vec<String> = tags
            .iter()
            .filter(|t| !known.contains(&t.to_ascii_lowercase()))
            .cloned()
            .collect();

        let rows = if missing.is_empty() {
            existing
        } else {
            debug!(missing = ?missing, "Creating genres");
            self.store.create_many(&missing).await?;
            self.store.find_by_names_case_insensitive(&tags).await?
        };

        let mut by_name: HashMap<String, Genre> = HashMap::with_capacity(rows.len());
        for genre in rows {
            by_name.entry(genre.name.to_ascii_lowercase()).or_insert(genre);
        }

        Ok(tags
            .iter()
            .filter_map(|t| by_name.get(&t.to_ascii_lowercase()).cloned())
            .collect())
    }
}
