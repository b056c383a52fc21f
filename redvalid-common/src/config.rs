//! Configuration loading and resolution
//!
//! Bootstrap settings come from four tiers, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing TOML file is not an error: the resolver logs a warning and
//! continues with defaults. A TOML file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend API used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Network the wallet signs for when the backend does not name one
pub const DEFAULT_NETWORK: &str = "testnet";

/// Passphrase paired with [`DEFAULT_NETWORK`]
pub const DEFAULT_NETWORK_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Passphrase of the public network
pub const PUBLIC_NETWORK_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Passphrase of the futurenet network
pub const FUTURENET_NETWORK_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";

/// Largest video file accepted for upload or query (50 MB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Upper bound on file preparation requests
pub const DEFAULT_FILE_PREPARE_TIMEOUT_SECS: u64 = 30;

pub const ENV_BACKEND_URL: &str = "REDVALID_BACKEND_URL";
pub const ENV_WALLET_BRIDGE_URL: &str = "REDVALID_WALLET_BRIDGE_URL";
pub const ENV_NETWORK: &str = "REDVALID_NETWORK";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the provenance backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,

    /// Base URL of the local wallet bridge (absent = no wallet available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_bridge_url: Option<String>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[network]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

/// `[upload]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_bytes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_prepare_timeout_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Network identity handed to the wallet when signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// Short network name understood by the wallet (e.g. "testnet")
    pub name: String,
    /// Full network passphrase
    pub passphrase: String,
}

impl Default for NetworkIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_NETWORK.to_string(),
            passphrase: DEFAULT_NETWORK_PASSPHRASE.to_string(),
        }
    }
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub wallet_bridge_url: Option<String>,
    pub network: NetworkIdentity,
    pub max_file_bytes: u64,
    pub file_prepare_timeout: Duration,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            wallet_bridge_url: None,
            network: NetworkIdentity::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            file_prepare_timeout: Duration::from_secs(DEFAULT_FILE_PREPARE_TIMEOUT_SECS),
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub wallet_bridge_url: Option<String>,
    pub network: Option<String>,
}

/// Resolves [`ClientConfig`] from command line, environment and TOML
pub struct ConfigResolver {
    overrides: ConfigOverrides,
    toml: TomlConfig,
}

impl ConfigResolver {
    pub fn new(overrides: ConfigOverrides, toml: TomlConfig) -> Self {
        Self { overrides, toml }
    }

    /// Load the TOML file at `path` (or the platform default) and build a resolver
    ///
    /// A missing file degrades to defaults with a warning.
    pub fn load(overrides: ConfigOverrides, path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let toml = match path {
            Some(path) => match load_toml_config(&path)? {
                Some(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                None => {
                    warn!(
                        "Config file not found at {}, using built-in defaults",
                        path.display()
                    );
                    TomlConfig::default()
                }
            },
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                TomlConfig::default()
            }
        };

        Ok(Self::new(overrides, toml))
    }

    pub fn resolve(&self) -> ClientConfig {
        let backend_url = pick(
            "backend_url",
            self.overrides.backend_url.clone(),
            ENV_BACKEND_URL,
            self.toml.backend_url.clone(),
        )
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let wallet_bridge_url = pick(
            "wallet_bridge_url",
            self.overrides.wallet_bridge_url.clone(),
            ENV_WALLET_BRIDGE_URL,
            self.toml.wallet_bridge_url.clone(),
        );

        let network_name = pick(
            "network",
            self.overrides.network.clone(),
            ENV_NETWORK,
            self.toml.network.name.clone(),
        )
        .unwrap_or_else(|| DEFAULT_NETWORK.to_string());

        let passphrase = self.resolve_passphrase(&network_name);

        let max_file_bytes = self
            .toml
            .upload
            .max_file_bytes
            .filter(|b| *b > 0)
            .unwrap_or(DEFAULT_MAX_FILE_BYTES);

        let timeout_secs = self
            .toml
            .upload
            .file_prepare_timeout_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_FILE_PREPARE_TIMEOUT_SECS);

        let config = ClientConfig {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            wallet_bridge_url: wallet_bridge_url.map(|u| u.trim_end_matches('/').to_string()),
            network: NetworkIdentity {
                name: network_name,
                passphrase,
            },
            max_file_bytes,
            file_prepare_timeout: Duration::from_secs(timeout_secs),
            log_level: self.toml.logging.level.clone(),
        };

        debug!(?config, "Resolved client configuration");
        config
    }

    /// Passphrase matching the resolved network name
    ///
    /// The TOML passphrase only applies to the TOML network. When the
    /// command line or environment picks another network, the passphrase
    /// comes from the well-known table instead.
    fn resolve_passphrase(&self, network_name: &str) -> String {
        let toml_name = self
            .toml
            .network
            .name
            .as_deref()
            .filter(|n| is_set(n))
            .unwrap_or(DEFAULT_NETWORK);
        let toml_passphrase = self.toml.network.passphrase.as_deref().filter(|p| is_set(p));

        if let Some(passphrase) = toml_passphrase {
            if toml_name == network_name {
                return passphrase.to_string();
            }
        }

        match well_known_passphrase(network_name) {
            Some(passphrase) => passphrase.to_string(),
            None => {
                let fallback = toml_passphrase.unwrap_or(DEFAULT_NETWORK_PASSPHRASE);
                warn!(
                    "No known passphrase for network '{}', using '{}'",
                    network_name, fallback
                );
                fallback.to_string()
            }
        }
    }
}

/// Passphrase for a network name the wallet understands
pub fn well_known_passphrase(network_name: &str) -> Option<&'static str> {
    match network_name.trim().to_ascii_lowercase().as_str() {
        "testnet" => Some(DEFAULT_NETWORK_PASSPHRASE),
        "public" | "mainnet" | "pubnet" => Some(PUBLIC_NETWORK_PASSPHRASE),
        "futurenet" => Some(FUTURENET_NETWORK_PASSPHRASE),
        _ => None,
    }
}

/// Choose the highest-priority non-blank value, warning when several sources set it
fn pick(
    key: &str,
    cli: Option<String>,
    env_var_name: &str,
    toml: Option<String>,
) -> Option<String> {
    let cli = cli.filter(|v| is_set(v));
    let env = std::env::var(env_var_name).ok().filter(|v| is_set(v));
    let toml = toml.filter(|v| is_set(v));

    let sources: Vec<&str> = [
        cli.as_ref().map(|_| "command line"),
        env.as_ref().map(|_| "environment"),
        toml.as_ref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sources.len() > 1 {
        warn!(
            "{} set in multiple sources: {}. Using {} (highest priority).",
            key,
            sources.join(", "),
            sources[0]
        );
    }

    cli.or(env).or(toml)
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Platform config file location: `<config_dir>/redvalid/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("redvalid").join("config.toml"))
}

/// Read and parse a TOML config file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(Some(config))
}

/// Write a TOML config atomically (temp file + rename)
///
/// On Unix the file is created with 0600 permissions.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_default_level_is_info() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_nested_tables_parse() {
        let config: TomlConfig = toml::from_str(
            r#"
            backend_url = "https://api.example.org"

            [network]
            name = "public"
            passphrase = "Public Global Stellar Network ; September 2015"

            [upload]
            max_file_bytes = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.backend_url.as_deref(), Some("https://api.example.org"));
        assert_eq!(config.network.name.as_deref(), Some("public"));
        assert_eq!(config.upload.max_file_bytes, Some(1024));
        assert_eq!(config.upload.file_prepare_timeout_secs, None);
    }

    #[test]
    fn test_resolve_without_sources_uses_toml_limits() {
        let toml = TomlConfig {
            upload: UploadConfig {
                max_file_bytes: Some(0),
                file_prepare_timeout_secs: Some(5),
            },
            ..Default::default()
        };
        let resolved = ConfigResolver::new(ConfigOverrides::default(), toml).resolve();

        // zero is treated as unset
        assert_eq!(resolved.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(resolved.file_prepare_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_network_override_brings_its_own_passphrase() {
        let overrides = ConfigOverrides {
            network: Some("public".to_string()),
            ..Default::default()
        };
        let resolved = ConfigResolver::new(overrides, TomlConfig::default()).resolve();

        assert_eq!(resolved.network.name, "public");
        assert_eq!(resolved.network.passphrase, PUBLIC_NETWORK_PASSPHRASE);
    }

    #[test]
    fn test_toml_passphrase_not_paired_with_other_network() {
        let toml = TomlConfig {
            network: NetworkConfig {
                name: Some("testnet".to_string()),
                passphrase: Some(DEFAULT_NETWORK_PASSPHRASE.to_string()),
            },
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            network: Some("futurenet".to_string()),
            ..Default::default()
        };
        let resolved = ConfigResolver::new(overrides, toml).resolve();

        assert_eq!(resolved.network.passphrase, FUTURENET_NETWORK_PASSPHRASE);
    }

    #[test]
    fn test_toml_network_keeps_custom_passphrase() {
        let toml = TomlConfig {
            network: NetworkConfig {
                name: Some("standalone".to_string()),
                passphrase: Some("Standalone Network ; February 2017".to_string()),
            },
            ..Default::default()
        };
        let resolved = ConfigResolver::new(ConfigOverrides::default(), toml).resolve();

        assert_eq!(resolved.network.name, "standalone");
        assert_eq!(resolved.network.passphrase, "Standalone Network ; February 2017");
    }

    #[test]
    fn test_well_known_passphrases() {
        assert_eq!(well_known_passphrase("testnet"), Some(DEFAULT_NETWORK_PASSPHRASE));
        assert_eq!(well_known_passphrase("PUBLIC"), Some(PUBLIC_NETWORK_PASSPHRASE));
        assert_eq!(well_known_passphrase("standalone"), None);
    }
}
