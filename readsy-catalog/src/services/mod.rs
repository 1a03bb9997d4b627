//! Reconciliation services
//!
//! - [`reconciler`]: top-level `reconcile(isbn)` flow
//! - [`catalog_sync`]: backfill/append onto an exact duplicate
//! - [`genre_normalizer`]: tag canonicalization and get-or-create

pub mod catalog_sync;
pub mod genre_normalizer;
pub mod reconciler;

pub use catalog_sync::{sync, SyncPlan};
pub use genre_normalizer::{normalize_tags, GenreNormalizer};
pub use reconciler::{clean_isbn, Reconciler};
