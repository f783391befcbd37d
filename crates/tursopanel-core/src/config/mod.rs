//! Configuration types for the tursopanel service.
//!
//! # Configuration file
//!
//! ```yaml
//! project: acme-panel
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! signing:
//!   private_key_env: TURSOPANEL_SIGNING_KEY
//!   private_key_file: keys/private.key
//! storage:
//!   path: data/tursopanel.sqlite
//! sqld:
//!   url: http://127.0.0.1:8081
//! bridge:
//!   url: http://127.0.0.1:8082
//!   password_env: BRIDGE_PASSWORD
//! ```
//!
//! Relative paths are resolved against the directory of the config file when
//! it is loaded through [`PanelConfig::load_with_context`].

pub mod server;
pub mod signing;
pub mod upstream;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use server::{AuthConfig, MAX_SESSION_TTL_HOURS, SeedUser, ServerConfig};
pub use signing::{EphemeralKeyPolicy, SigningConfig};
pub use upstream::{BridgeConfig, SqldConfig, StatsConfig};

/// Complete tursopanel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PanelConfig {
    /// Project name, used in log lines only.
    #[serde(default)]
    pub project: Option<String>,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Users seeded into the store at startup.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Token signing key material.
    #[serde(default)]
    pub signing: SigningConfig,

    /// Local SQLite store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// The sibling database-serving process.
    #[serde(default)]
    pub sqld: SqldConfig,

    /// The bridge process listing provisioned database directories.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Periodic stats refresh.
    #[serde(default)]
    pub stats: StatsConfig,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite file. Parent directories are created on open.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/tursopanel.sqlite")
}

fn default_max_connections() -> u32 {
    5
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PanelConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to `null`; treat it as all defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve relative paths against the file's directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.storage.path = resolve_path(&base_dir, &config.storage.path);
        if let Some(file) = &config.signing.private_key_file {
            config.signing.private_key_file = Some(resolve_path(&base_dir, file));
        }
        if let Some(file) = &config.signing.public_key_file {
            config.signing.public_key_file = Some(resolve_path(&base_dir, file));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats.bucket_secs == 0 {
            return Err(ConfigError::Config(
                "stats.bucket_secs must be greater than zero".to_string(),
            ));
        }
        if self.stats.interval_secs == 0 {
            return Err(ConfigError::Config(
                "stats.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.session_ttl_hours == 0
            || self.server.session_ttl_hours > MAX_SESSION_TTL_HOURS
        {
            return Err(ConfigError::Config(format!(
                "server.session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
            )));
        }
        for user in &self.auth.users {
            if user.username.trim().is_empty() {
                return Err(ConfigError::Config(
                    "auth.users entry has an empty username".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
