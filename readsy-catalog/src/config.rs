//! Configuration resolution for readsy-catalog
//!
//! Provides multi-tier resolution of source settings with ENV → TOML
//! priority. Bootstrap settings (root folder, logging) live in
//! `readsy_common::config`.

use readsy_common::config::SourcesConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding `sources.google_api_key`
pub const GOOGLE_API_KEY_ENV: &str = "READSY_GOOGLE_API_KEY";

/// Resolve the Google Books API key
///
/// **Priority:** ENV → TOML. The key is optional: without one, Google Books
/// is queried anonymously under the shared quota.
pub fn resolve_google_api_key(sources: &SourcesConfig) -> Option<String> {
    let env_key = std::env::var(GOOGLE_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = sources
        .google_api_key
        .as_ref()
        .filter(|k| is_valid_key(k))
        .cloned();

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Google Books API key found in multiple sources: environment, TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Google Books API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Google Books API key loaded from TOML config");
        return Some(key);
    }

    info!("No Google Books API key configured, using anonymous quota");
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Per-source lookup budget
pub fn source_timeout(sources: &SourcesConfig) -> Duration {
    Duration::from_millis(sources.source_timeout_ms.max(1))
}
