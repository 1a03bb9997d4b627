//! Unit tests for configuration and graceful degradation
//!
//! Covers root folder priority order, directory creation and TOML parsing.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate READSY_ROOT_FOLDER or READSY_ROOT are marked with
//! #[serial] so they run sequentially.

use readsy_common::config::{
    load_toml_config, CompiledDefaults, LoggingConfig, RootFolderInitializer,
    RootFolderResolver, SourcesConfig, TomlConfig,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
}

#[test]
fn test_log_file_absent_means_stderr() {
    assert!(LoggingConfig::default().open_file().unwrap().is_none());
}

#[test]
fn test_log_file_created_with_parents_and_appended() {
    use std::io::Write;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("logs").join("catalog.log");
    let logging = LoggingConfig {
        file: Some(path.clone()),
        ..LoggingConfig::default()
    };

    let mut first = logging.open_file().unwrap().expect("File should be opened");
    writeln!(first, "first").unwrap();
    drop(first);

    let mut second = logging.open_file().unwrap().expect("File should be reopened");
    writeln!(second, "second").unwrap();
    drop(second);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins() {
    env::set_var("READSY_ROOT_FOLDER", "/tmp/readsy-env-loses");

    let resolver = RootFolderResolver::new("test-module")
        .with_cli_arg(Some(PathBuf::from("/tmp/readsy-cli-wins")));

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/readsy-cli-wins"));

    env::remove_var("READSY_ROOT_FOLDER");
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    let test_path = "/tmp/readsy-test-env-folder";
    env::set_var("READSY_ROOT_FOLDER", test_path);

    let resolver = RootFolderResolver::new("test-module");
    assert_eq!(resolver.resolve(), PathBuf::from(test_path));

    env::remove_var("READSY_ROOT_FOLDER");
}

#[test]
#[serial]
fn test_resolver_root_folder_takes_precedence_over_root() {
    env::remove_var("READSY_ROOT_FOLDER");
    env::remove_var("READSY_ROOT");

    env::set_var("READSY_ROOT_FOLDER", "/tmp/readsy-priority-1");
    env::set_var("READSY_ROOT", "/tmp/readsy-priority-2");

    let resolver = RootFolderResolver::new("test-module");
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/readsy-priority-1"));

    env::remove_var("READSY_ROOT_FOLDER");
    env::remove_var("READSY_ROOT");
}

#[test]
#[serial]
fn test_resolver_missing_config_file_falls_back_to_default() {
    env::remove_var("READSY_ROOT_FOLDER");
    env::remove_var("READSY_ROOT");

    let resolver = RootFolderResolver::new("nonexistent-test-module-12345");
    let root_folder = resolver.resolve();

    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
fn test_config_file_path_uses_module_name() {
    let resolver = RootFolderResolver::new("readsy-catalog");
    if let Some(path) = resolver.config_file_path() {
        assert!(path.ends_with("readsy/readsy-catalog.toml"));
    }
}

#[test]
#[serial]
fn test_resolver_reads_root_from_explicit_config_file() {
    env::remove_var("READSY_ROOT_FOLDER");
    env::remove_var("READSY_ROOT");

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    std::fs::write(&config_path, "root_folder = \"/tmp/readsy-from-toml\"\n").unwrap();

    let resolver = RootFolderResolver::new("readsy-catalog")
        .with_config_file(Some(config_path.clone()));

    assert_eq!(resolver.config_file_path(), Some(config_path));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/readsy-from-toml"));
}

#[test]
fn test_initializer_creates_nested_directory_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("level1").join("level2");

    let initializer = RootFolderInitializer::new(root.clone());
    assert!(initializer.ensure_directory_exists().is_ok());
    assert!(initializer.ensure_directory_exists().is_ok());

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("readsy.db"));
    assert!(!initializer.database_exists());
}

#[test]
fn test_missing_toml_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.sources.source_timeout_ms, 10_000);
    assert_eq!(config.sources.open_library_requests_per_second, 3);
}

#[test]
fn test_partial_toml_keeps_defaults_for_missing_fields() {
    let toml_str = r#"
        root_folder = "/books"
        [logging]
        level = "debug"
        [sources]
        google_api_key = "abc"
        source_timeout_ms = 2500
    "#;

    let config: TomlConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/books")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.sources.google_api_key.as_deref(), Some("abc"));
    assert_eq!(config.sources.source_timeout_ms, 2500);
    assert_eq!(
        config.sources.open_library_base_url,
        SourcesConfig::default().open_library_base_url
    );
}

#[test]
fn test_malformed_toml_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[sources\nsource_timeout_ms = ").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, readsy_common::Error::Config(_)));
}

#[test]
fn test_toml_roundtrip() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/books")),
        logging: LoggingConfig::default(),
        sources: SourcesConfig {
            google_api_key: Some("test-key-123".to_string()),
            ..SourcesConfig::default()
        },
    };

    let toml_str = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&toml_str).unwrap();

    assert_eq!(parsed, config);
}
