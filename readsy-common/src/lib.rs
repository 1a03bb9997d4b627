//! # Readsy Common Library
//!
//! Shared code for the Readsy catalog crates:
//! - Error type used by every store operation
//! - Bootstrap configuration (TOML, environment, root folder resolution)
//! - SQLite initialization and catalog schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
