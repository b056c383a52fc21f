//! Configuration resolution and graceful degradation tests
//!
//! Tests that touch REDVALID_* environment variables are marked #[serial]
//! so they never run in parallel with each other.

use redvalid_common::config::{
    load_toml_config, write_toml_config, ConfigOverrides, ConfigResolver, LoggingConfig,
    NetworkConfig, TomlConfig, DEFAULT_BACKEND_URL, DEFAULT_MAX_FILE_BYTES, DEFAULT_NETWORK,
    DEFAULT_NETWORK_PASSPHRASE, ENV_BACKEND_URL, ENV_NETWORK, ENV_WALLET_BRIDGE_URL,
    PUBLIC_NETWORK_PASSPHRASE,
};
use serial_test::serial;
use std::env;
use std::time::Duration;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_BACKEND_URL);
    env::remove_var(ENV_WALLET_BRIDGE_URL);
    env::remove_var(ENV_NETWORK);
}

#[test]
#[serial]
fn test_missing_file_degrades_to_defaults() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let resolver = ConfigResolver::load(ConfigOverrides::default(), Some(&path)).unwrap();
    let config = resolver.resolve();

    assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.wallet_bridge_url, None);
    assert_eq!(config.network.name, DEFAULT_NETWORK);
    assert_eq!(config.network.passphrase, DEFAULT_NETWORK_PASSPHRASE);
    assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
    assert_eq!(config.file_prepare_timeout, Duration::from_secs(30));
    assert_eq!(config.log_level, "info");
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "backend_url = [unterminated").unwrap();

    let result = ConfigResolver::load(ConfigOverrides::default(), Some(&path));
    assert!(result.is_err(), "malformed TOML should not be silently ignored");
}

#[test]
#[serial]
fn test_toml_values_are_used() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
backend_url = "https://backend.example.org/"
wallet_bridge_url = "http://127.0.0.1:9911"

[network]
name = "public"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = ConfigResolver::load(ConfigOverrides::default(), Some(&path))
        .unwrap()
        .resolve();

    // trailing slash trimmed so paths can be appended
    assert_eq!(config.backend_url, "https://backend.example.org");
    assert_eq!(config.wallet_bridge_url.as_deref(), Some("http://127.0.0.1:9911"));
    assert_eq!(config.network.name, "public");
    assert_eq!(config.log_level, "debug");
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ENV_BACKEND_URL, "http://env-backend:8000");

    let toml = TomlConfig {
        backend_url: Some("http://toml-backend:8000".to_string()),
        ..Default::default()
    };
    let config = ConfigResolver::new(ConfigOverrides::default(), toml).resolve();

    assert_eq!(config.backend_url, "http://env-backend:8000");
    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env_and_toml() {
    clear_env();
    env::set_var(ENV_NETWORK, "futurenet");

    let toml = TomlConfig {
        network: NetworkConfig {
            name: Some("public".to_string()),
            passphrase: None,
        },
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        network: Some("testnet".to_string()),
        ..Default::default()
    };
    let config = ConfigResolver::new(overrides, toml).resolve();

    assert_eq!(config.network.name, "testnet");
    assert_eq!(config.network.passphrase, DEFAULT_NETWORK_PASSPHRASE);
    clear_env();
}

#[test]
#[serial]
fn test_env_network_signs_with_matching_passphrase() {
    clear_env();
    env::set_var(ENV_NETWORK, "public");

    let config = ConfigResolver::new(ConfigOverrides::default(), TomlConfig::default()).resolve();

    assert_eq!(config.network.name, "public");
    assert_eq!(config.network.passphrase, PUBLIC_NETWORK_PASSPHRASE);
    assert_ne!(config.network.passphrase, DEFAULT_NETWORK_PASSPHRASE);
    clear_env();
}

#[test]
#[serial]
fn test_blank_values_are_ignored() {
    clear_env();
    env::set_var(ENV_WALLET_BRIDGE_URL, "   ");

    let overrides = ConfigOverrides {
        backend_url: Some(String::new()),
        ..Default::default()
    };
    let config = ConfigResolver::new(overrides, TomlConfig::default()).resolve();

    assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.wallet_bridge_url, None);
    clear_env();
}

#[test]
fn test_write_then_load_preserves_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let config = TomlConfig {
        backend_url: Some("https://backend.example.org".to_string()),
        wallet_bridge_url: None,
        logging: LoggingConfig {
            level: "warn".to_string(),
        },
        ..Default::default()
    };

    write_toml_config(&config, &path).unwrap();

    assert!(path.exists());
    assert!(!temp_dir.path().join("nested").join("config.toml.tmp").exists());

    let loaded = load_toml_config(&path).unwrap().unwrap();
    assert_eq!(loaded, config);
}

#[cfg(unix)]
#[test]
fn test_written_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    write_toml_config(&TomlConfig::default(), &path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn test_load_missing_file_returns_none() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();
    assert!(result.is_none());
}
