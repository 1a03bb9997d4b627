//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration only: where the catalog database lives, how to
//! log, and how to reach the external bibliographic sources. Resolution
//! priority for the root folder:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`READSY_ROOT_FOLDER`, then `READSY_ROOT`)
//! 3. TOML config file (`~/.config/readsy/<module>.toml`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "readsy.db";

const ENV_ROOT_FOLDER: &str = "READSY_ROOT_FOLDER";
const ENV_ROOT: &str = "READSY_ROOT";

/// Compiled-in defaults used when no other configuration is available
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/readsy (or /var/lib/readsy for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("readsy"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/readsy"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/readsy
        dirs::data_dir()
            .map(|d| d.join("readsy"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/readsy"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\readsy
        dirs::data_local_dir()
            .map(|d| d.join("readsy"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\readsy"))
    } else {
        PathBuf::from("./readsy_data")
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// Every section is optional; a missing or empty file yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Root folder holding the catalog database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External bibliographic source settings
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Open the configured log file for appending, creating parent folders
    ///
    /// Returns `None` when no file is configured (log to stderr).
    pub fn open_file(&self) -> Result<Option<File>> {
        let Some(path) = &self.file else {
            return Ok(None);
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Logging to {}", path.display());
        Ok(Some(file))
    }
}

/// External source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcesConfig {
    /// OpenLibrary base URL (no trailing slash)
    #[serde(default = "default_open_library_base_url")]
    pub open_library_base_url: String,

    /// Google Books API base URL (no trailing slash)
    #[serde(default = "default_google_books_base_url")]
    pub google_books_base_url: String,

    /// Optional Google Books API key (anonymous quota is used when absent)
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// Per-source lookup budget; an expired lookup counts as "no record"
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    /// OpenLibrary request rate (edition and author lookups share it)
    #[serde(default = "default_open_library_rps")]
    pub open_library_requests_per_second: u32,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            open_library_base_url: default_open_library_base_url(),
            google_books_base_url: default_google_books_base_url(),
            google_api_key: None,
            source_timeout_ms: default_source_timeout_ms(),
            open_library_requests_per_second: default_open_library_rps(),
        }
    }
}

fn default_open_library_base_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_google_books_base_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_source_timeout_ms() -> u64 {
    10_000
}

fn default_open_library_rps() -> u32 {
    3
}

/// Standard User-Agent for outbound HTTP clients
///
/// OpenLibrary asks clients to identify themselves so heavy users can be
/// contacted instead of blocked.
pub fn get_user_agent() -> String {
    format!(
        "Readsy/{} (https://github.com/readsy/readsy)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Load TOML configuration from an explicit path
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    debug!(path = %path.display(), "Loaded TOML configuration");
    Ok(config)
}

/// Resolves the root folder for one module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            config_file: None,
        }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Explicit config file replacing the default location
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Config file location for this module (explicit path, else the default)
    pub fn config_file_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_file {
            return Some(path.clone());
        }
        dirs::config_dir().map(|d| {
            d.join("readsy")
                .join(format!("{}.toml", self.module_name))
        })
    }

    /// Resolve root folder; never fails, falls back to compiled default
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // READSY_ROOT_FOLDER takes precedence over READSY_ROOT
        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ENV_ROOT) {
            return PathBuf::from(path);
        }

        if let Some(config_path) = self.config_file_path() {
            if config_path.exists() {
                match load_toml_config(&config_path) {
                    Ok(TomlConfig {
                        root_folder: Some(root),
                        ..
                    }) => return root,
                    Ok(_) => {}
                    Err(e) => warn!("Ignoring unreadable config file: {}", e),
                }
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
