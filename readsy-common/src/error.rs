//! Common error types for Readsy

use thiserror::Error;

/// Common result type for Readsy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Readsy crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    ///
    /// Catalog, author and genre store failures all surface through this
    /// variant and are fatal to a reconciliation call.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error came from the local store rather than caller input
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}
