//! readsy-catalog library interface
//!
//! ISBN reconciliation engine: source adapters, merge engine, identity
//! resolution, catalog sync and genre normalization over a SQLite catalog.
//! The `readsy-catalog` binary is a thin CLI over [`services::Reconciler`].

pub mod config;
pub mod db;
pub mod fusion;
pub mod services;
pub mod sources;
pub mod store;
pub mod types;

pub use services::Reconciler;
pub use types::{CanonicalRecord, CatalogEntry, ExternalRecord, Outcome, SourceKind};
